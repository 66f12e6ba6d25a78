//! log command - Display managed branches as a tree rooted at trunk
//!
//! ```text
//! main
//! ├─ auth-refactor  Split auth module
//! │  └─ * login-page  Add login page
//! └─ fix-typo
//! ```
//!
//! Branches whose parent is no longer managed are listed after the tree,
//! each with its own subtree.

use std::fmt::Write as _;

use anyhow::Result;

use super::Session;
use crate::core::stack::StackModel;
use crate::core::types::BranchName;
use crate::engine::Context;
use crate::git::Vcs;

pub fn log(ctx: &Context) -> Result<()> {
    let session = Session::open(ctx)?;
    let model = session.store.load()?;
    let head = session.git.head()?;

    print!("{}", render_forest(&model, head.branch()));
    Ok(())
}

fn render_forest(model: &StackModel, current: Option<&BranchName>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", label(model, model.trunk(), current));
    render_children(model, model.trunk(), current, "", &mut out);

    let dangling = model.dangling();
    if !dangling.is_empty() {
        out.push_str("\nparent missing (run `gt restack` to repair):\n");
        for branch in &dangling {
            let _ = writeln!(out, "{}", label(model, branch, current));
            render_children(model, branch, current, "", &mut out);
        }
    }
    out
}

fn render_children(
    model: &StackModel,
    parent: &BranchName,
    current: Option<&BranchName>,
    indent: &str,
    out: &mut String,
) {
    let children = model.children(parent);
    let count = children.len();
    for (i, child) in children.iter().enumerate() {
        let last = i + 1 == count;
        let (branch, next) = if last { ("└─ ", "   ") } else { ("├─ ", "│  ") };
        let _ = writeln!(out, "{}{}{}", indent, branch, label(model, child, current));
        render_children(model, child, current, &format!("{}{}", indent, next), out);
    }
}

fn label(model: &StackModel, name: &BranchName, current: Option<&BranchName>) -> String {
    let marker = if current == Some(name) { "* " } else { "" };
    let description = model
        .get(name)
        .map(|b| b.description.lines().next().unwrap_or_default().trim())
        .filter(|d| !d.is_empty() && *d != name.as_str());
    match description {
        Some(d) => format!("{}{}  {}", marker, name, d),
        None => format!("{}{}", marker, name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::stack::RemovalPolicy;

    fn b(name: &str) -> BranchName {
        BranchName::new(name).unwrap()
    }

    fn model() -> StackModel {
        let mut model = StackModel::new(b("main"));
        model.add_managed(b("a"), b("main"), "Add a").unwrap();
        model.add_managed(b("b"), b("a"), "b").unwrap();
        model.add_managed(b("c"), b("main"), "").unwrap();
        model
    }

    #[test]
    fn renders_tree_with_current_marker() {
        let rendered = render_forest(&model(), Some(&b("b")));
        assert_eq!(rendered, "main\n├─ a  Add a\n│  └─ * b\n└─ c\n");
    }

    #[test]
    fn empty_stack_is_just_trunk() {
        let rendered = render_forest(&StackModel::new(b("main")), Some(&b("main")));
        assert_eq!(rendered, "* main\n");
    }

    #[test]
    fn dangling_branches_listed_separately() {
        let mut model = model();
        model.remove(&b("a"), RemovalPolicy::Dangle).unwrap();

        let rendered = render_forest(&model, None);

        assert!(rendered.starts_with("main\n└─ c\n"));
        assert!(rendered.contains("parent missing"));
        assert!(rendered.ends_with("\nb\n"));
    }
}
