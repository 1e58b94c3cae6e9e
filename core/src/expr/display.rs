//! Unparsing of expressions, for diagnostics.

use std::fmt;

use super::{Expr, ExprKind, Function};

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ExprKind::Literal(value) => write!(f, "{}", value),
            ExprKind::Member(m) => write!(f, "{}", m),
            ExprKind::Hierarchy(h) => write!(f, "{}", h),
            ExprKind::Level(l) => write!(f, "{}", l.unique_name()),
            ExprKind::Dimension(d) => write!(f, "{}", d),
            ExprKind::Parameter(p) => write!(f, "ParamRef({})", p.name()),
            ExprKind::Call { function, args } => write_call(f, function, args),
        }
    }
}

fn write_call(f: &mut fmt::Formatter<'_>, function: &Function, args: &[std::sync::Arc<Expr>]) -> fmt::Result {
    match function {
        // Property syntax: `<arg>.Name`.
        Function::CurrentMember
        | Function::DefaultMember
        | Function::Parent
        | Function::MemberLevel
        | Function::MemberHierarchy
        | Function::LevelHierarchy
        | Function::HierarchyDimension
        | Function::Name
        | Function::UniqueName
            if args.len() == 1 =>
        {
            write!(f, "{}.{}", args[0], function.name())
        }
        Function::Item if args.len() == 2 => write!(f, "{}.Item({})", args[0], args[1]),
        Function::Tuple => write_list(f, "(", args, ")"),
        Function::Set => write_list(f, "{", args, "}"),
        Function::Arithmetic(_) | Function::Compare(_) | Function::And | Function::Or
            if args.len() == 2 =>
        {
            write!(f, "({} {} {})", args[0], function.name(), args[1])
        }
        Function::Negate if args.len() == 1 => write!(f, "-{}", args[0]),
        Function::Not if args.len() == 1 => write!(f, "NOT {}", args[0]),
        _ => {
            write!(f, "{}", function.name())?;
            write_list(f, "(", args, ")")
        }
    }
}

fn write_list(
    f: &mut fmt::Formatter<'_>,
    open: &str,
    args: &[std::sync::Arc<Expr>],
    close: &str,
) -> fmt::Result {
    f.write_str(open)?;
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", arg)?;
    }
    f.write_str(close)
}
