// File: src/printer.rs
//
// Pretty printers for the Kat AST.
//
// `Display` renders nodes back to parseable source with every compound
// expression parenthesised, so printing the re-parse of a printed program
// reproduces the same text. `Program::tree()` renders an indented
// box-drawing view used by `kat ast`.

use crate::ast::{BinaryOp, Block, Expr, FunctionTarget, Program, Stmt};
use std::fmt;

fn write_escaped(f: &mut fmt::Formatter<'_>, value: &str) -> fmt::Result {
    f.write_str("\"")?;
    for ch in value.chars() {
        match ch {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\t' => f.write_str("\\t")?,
            '\r' => f.write_str("\\r")?,
            other => write!(f, "{}", other)?,
        }
    }
    f.write_str("\"")
}

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

/// Expressions in `if`/`for` headers that would end in, or contain at top
/// level, a struct literal must be grouped so `{` is not read as the body
struct Header<'a>(&'a Expr);

impl fmt::Display for Header<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Expr::StructLiteral { .. }
            | Expr::Index { .. }
            | Expr::Call { .. }
            | Expr::Binary { op: BinaryOp::Member, .. } => write!(f, "({})", self.0),
            other => write!(f, "{}", other),
        }
    }
}

/// Positional notation with a mandatory `.`; the scanner has no exponent
/// syntax and `1.0` must not reparse as an integer
fn write_float(f: &mut fmt::Formatter<'_>, value: f64) -> fmt::Result {
    let text = value.to_string();
    if value.is_finite() && !text.contains('.') {
        write!(f, "{}.0", text)
    } else {
        f.write_str(&text)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Integer { value, .. } => write!(f, "{}", value),
            Expr::Float { value, .. } => write_float(f, *value),
            Expr::Boolean { value, .. } => write!(f, "{}", value),
            Expr::Str { value, .. } => write_escaped(f, value),
            Expr::Identifier { name, .. } => f.write_str(name),
            Expr::SelfRef { .. } => f.write_str("self"),
            Expr::Prefix { op, right, .. } => write!(f, "({}{})", op.symbol(), right),
            Expr::Postfix { op, left, .. } => write!(f, "({}{})", left, op.symbol()),
            Expr::Binary { op: BinaryOp::Member, left, right, .. } => {
                write!(f, "{}.{}", left, right)
            }
            Expr::Binary { op, left, right, .. } => {
                write!(f, "({} {} {})", left, op.symbol(), right)
            }
            Expr::Ternary { condition, then_arm, else_arm, .. } => {
                write!(f, "({} ? {} : {})", condition, then_arm, else_arm)
            }
            Expr::Array { elements, .. } => {
                f.write_str("[")?;
                write_list(f, elements)?;
                f.write_str("]")
            }
            Expr::Map { entries, .. } => {
                f.write_str("{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                f.write_str("}")
            }
            Expr::Index { left, index, .. } => write!(f, "{}[{}]", left, index),
            Expr::Call { callee, args, .. } => {
                write!(f, "{}(", callee)?;
                write_list(f, args)?;
                f.write_str(")")
            }
            Expr::StructLiteral { name, fields, .. } => {
                write!(f, "{}{{", name)?;
                for (i, (field, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", field, value)?;
                }
                f.write_str("}")
            }
            Expr::Function { params, body, .. } => {
                f.write_str("fn(")?;
                write_list(f, params)?;
                write!(f, ") {}", body)
            }
            Expr::Import { path, .. } => write!(f, "import({})", path),
        }
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.body.is_empty() {
            return f.write_str("{ }");
        }
        f.write_str("{ ")?;
        for (i, stmt) in self.body.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", stmt)?;
        }
        f.write_str(" }")
    }
}

impl fmt::Display for FunctionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FunctionTarget::Name(name) => f.write_str(name),
            FunctionTarget::Method { receiver, method } => write!(f, "{}.{}", receiver, method),
        }
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stmt::Expression { expr } => write!(f, "{}", expr),
            Stmt::Let { target, value, .. } => write!(f, "let {} = {}", target, value),
            Stmt::Const { target, value, .. } => write!(f, "const {} = {}", target, value),
            Stmt::Struct { name, fields, .. } => {
                if fields.is_empty() {
                    return write!(f, "struct {} {{ }}", name);
                }
                write!(f, "struct {} {{ ", name)?;
                write_list(f, fields)?;
                f.write_str(" }")
            }
            Stmt::Function { target, params, body, .. } => {
                write!(f, "fn {}(", target)?;
                write_list(f, params)?;
                write!(f, ") {}", body)
            }
            Stmt::Block(block) => write!(f, "{}", block),
            Stmt::If { condition, then_branch, else_branch, .. } => {
                write!(f, "if {} {}", Header(condition), then_branch)?;
                match else_branch {
                    Some(branch) => write!(f, " else {}", branch),
                    None => Ok(()),
                }
            }
            Stmt::ClassicFor { init, condition, post, body, .. } => {
                write!(f, "for {}; {}; {} {}", init, Header(condition), Header(post), body)
            }
            Stmt::ModernFor { condition, body, .. } => {
                write!(f, "for {} {}", Header(condition), body)
            }
            Stmt::Return { value: Some(value), .. } => write!(f, "return {}", value),
            Stmt::Return { value: None, .. } => f.write_str("return"),
        }
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for stmt in &self.body {
            writeln!(f, "{}", stmt)?;
        }
        Ok(())
    }
}

// --- TREE VIEW ---

struct TreeNode {
    label: String,
    children: Vec<TreeNode>,
}

impl TreeNode {
    fn leaf(label: impl Into<String>) -> Self {
        TreeNode { label: label.into(), children: Vec::new() }
    }

    fn branch(label: impl Into<String>, children: Vec<TreeNode>) -> Self {
        TreeNode { label: label.into(), children }
    }

    fn render(&self, prefix: &str, out: &mut String) {
        for (i, child) in self.children.iter().enumerate() {
            let last = i + 1 == self.children.len();
            out.push_str(prefix);
            out.push_str(if last { "└── " } else { "├── " });
            out.push_str(&child.label);
            out.push('\n');
            let extension = if last { "    " } else { "│   " };
            child.render(&format!("{}{}", prefix, extension), out);
        }
    }
}

fn block_node(label: &str, block: &Block) -> TreeNode {
    TreeNode::branch(label, block.body.iter().map(stmt_node).collect())
}

fn expr_node(expr: &Expr) -> TreeNode {
    match expr {
        Expr::Integer { value, .. } => TreeNode::leaf(format!("Integer {}", value)),
        Expr::Float { value, .. } => TreeNode::leaf(format!("Float {:?}", value)),
        Expr::Boolean { value, .. } => TreeNode::leaf(format!("Boolean {}", value)),
        Expr::Str { value, .. } => TreeNode::leaf(format!("String {:?}", value)),
        Expr::Identifier { name, .. } => TreeNode::leaf(format!("Identifier {}", name)),
        Expr::SelfRef { .. } => TreeNode::leaf("Self"),
        Expr::Prefix { op, right, .. } => {
            TreeNode::branch(format!("Prefix {}", op.symbol()), vec![expr_node(right)])
        }
        Expr::Postfix { op, left, .. } => {
            TreeNode::branch(format!("Postfix {}", op.symbol()), vec![expr_node(left)])
        }
        Expr::Binary { op, left, right, .. } => {
            let label = match op {
                BinaryOp::Member => "Member".to_string(),
                BinaryOp::Assign => "Assign".to_string(),
                other => format!("Binary {}", other.symbol()),
            };
            TreeNode::branch(label, vec![expr_node(left), expr_node(right)])
        }
        Expr::Ternary { condition, then_arm, else_arm, .. } => TreeNode::branch(
            "Ternary",
            vec![expr_node(condition), expr_node(then_arm), expr_node(else_arm)],
        ),
        Expr::Array { elements, .. } => {
            TreeNode::branch("Array", elements.iter().map(expr_node).collect())
        }
        Expr::Map { entries, .. } => TreeNode::branch(
            "Map",
            entries
                .iter()
                .map(|(key, value)| TreeNode::branch("Entry", vec![expr_node(key), expr_node(value)]))
                .collect(),
        ),
        Expr::Index { left, index, .. } => {
            TreeNode::branch("Index", vec![expr_node(left), expr_node(index)])
        }
        Expr::Call { callee, args, .. } => {
            let mut children = vec![expr_node(callee)];
            children.extend(args.iter().map(expr_node));
            TreeNode::branch("Call", children)
        }
        Expr::StructLiteral { name, fields, .. } => TreeNode::branch(
            format!("StructLiteral {}", name),
            fields
                .iter()
                .map(|(field, value)| TreeNode::branch(format!("Field {}", field), vec![expr_node(value)]))
                .collect(),
        ),
        Expr::Function { params, body, .. } => {
            block_node(&format!("Function ({})", params.join(", ")), body)
        }
        Expr::Import { path, .. } => TreeNode::branch("Import", vec![expr_node(path)]),
    }
}

fn stmt_node(stmt: &Stmt) -> TreeNode {
    match stmt {
        Stmt::Expression { expr } => TreeNode::branch("ExpressionStatement", vec![expr_node(expr)]),
        Stmt::Let { target, value, .. } => {
            TreeNode::branch("Let", vec![expr_node(target), expr_node(value)])
        }
        Stmt::Const { target, value, .. } => {
            TreeNode::branch("Const", vec![expr_node(target), expr_node(value)])
        }
        Stmt::Struct { name, fields, .. } => {
            TreeNode::leaf(format!("Struct {} ({})", name, fields.join(", ")))
        }
        Stmt::Function { target, params, body, .. } => {
            let kind = match target {
                FunctionTarget::Name(_) => "Function",
                FunctionTarget::Method { .. } => "Method",
            };
            block_node(&format!("{} {} ({})", kind, target, params.join(", ")), body)
        }
        Stmt::Block(block) => block_node("Block", block),
        Stmt::If { condition, then_branch, else_branch, .. } => {
            let mut children = vec![expr_node(condition), block_node("Then", then_branch)];
            if let Some(branch) = else_branch {
                children.push(TreeNode::branch("Else", vec![stmt_node(branch)]));
            }
            TreeNode::branch("If", children)
        }
        Stmt::ClassicFor { init, condition, post, body, .. } => TreeNode::branch(
            "ClassicFor",
            vec![stmt_node(init), expr_node(condition), expr_node(post), block_node("Body", body)],
        ),
        Stmt::ModernFor { condition, body, .. } => {
            TreeNode::branch("ModernFor", vec![expr_node(condition), block_node("Body", body)])
        }
        Stmt::Return { value, .. } => {
            TreeNode::branch("Return", value.iter().map(expr_node).collect())
        }
    }
}

impl Program {
    /// Indented box-drawing view of the program
    pub fn tree(&self) -> String {
        let root = TreeNode::branch("Program", self.body.iter().map(stmt_node).collect());
        let mut out = String::from("Program\n");
        root.render("", &mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::parse;
    use pretty_assertions::assert_eq;

    fn print(source: &str) -> String {
        match parse(source) {
            Ok(program) => program.to_string(),
            Err(err) => panic!("parse failed for {:?}: {}", source, err),
        }
    }

    fn assert_round_trip(source: &str) {
        let first = print(source);
        let second = print(&first);
        assert_eq!(first, second, "printed form did not survive a re-parse");
    }

    #[test]
    fn test_prints_fully_parenthesised_source() {
        let printed = print("let x = 2 + 3 * 4\nx = x - 1");
        assert_eq!(printed, "let x = (2 + (3 * 4))\n(x = (x - 1))\n");
    }

    #[test]
    fn test_floats_keep_fraction() {
        assert_eq!(print("1.0 + 2.5"), "(1.0 + 2.5)\n");
    }

    #[test]
    fn test_extreme_floats_print_without_exponent() {
        assert_eq!(
            print("let a = 100000000000000000000.0"),
            "let a = 100000000000000000000.0\n"
        );
        assert_eq!(print("let b = 0.0000001"), "let b = 0.0000001\n");
        assert_round_trip("let c = [100000000000000000000.0, 0.0000001, 12345678.5]");
    }

    #[test]
    fn test_strings_are_escaped() {
        assert_eq!(print(r#"let s = "a\"b\n""#), "let s = \"a\\\"b\\n\"\n");
    }

    #[test]
    fn test_declarations_and_control_flow() {
        let source = "struct Point { x, y }\n\
                      fn Point.setX(self, v) {\n  self.x = v\n}\n\
                      if p.x < 3 { return 1 } else if q { } else { 2 }\n\
                      for let i = 0; i < 3; i++ { f(i) }";
        assert_eq!(
            print(source),
            "struct Point { x, y }\n\
             fn Point.setX(self, v) { (self.x = v) }\n\
             if (p.x < 3) { return 1 } else if q { } else { 2 }\n\
             for let i = 0; (i < 3); (i++) { f(i) }\n"
        );
    }

    #[test]
    fn test_round_trip_is_stable() {
        assert_round_trip(
            "struct Point { x, y }\n\
             fn Point.setX(self, v) { self.x = v; return self }\n\
             let p = Point{x: 1, y: 2}\n\
             let m = {name: \"kat\", \"k\": [1, 2.0, -3]}\n\
             let f = fn(a, b) { return a > b ? a : b }\n\
             for i < 10 { i++ }\n\
             if (Point{x: 1}).x == 1 { p.setX(m[\"k\"][0]) }\n\
             const fmt = import(\"fmt\")\n\
             { let inner = !true }",
        );
    }

    #[test]
    fn test_struct_literal_condition_is_grouped() {
        assert_eq!(print("if (Point{x: 1}) { }"), "if (Point{x: 1}) { }\n");
        assert_round_trip("for (Point{x: 1}).x { }");
    }

    #[test]
    fn test_tree_view() {
        let program = parse("let x = 1 + 2\nfn f(a) { return a }").unwrap();
        assert_eq!(
            program.tree(),
            "Program\n\
             ├── Let\n\
             │   ├── Identifier x\n\
             │   └── Binary +\n\
             │       ├── Integer 1\n\
             │       └── Integer 2\n\
             └── Function f (a)\n\
             \x20   └── Return\n\
             \x20       └── Identifier a\n"
        );
    }
}
