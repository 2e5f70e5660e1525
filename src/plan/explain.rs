use std::borrow::Cow;
use std::io::{BufWriter, Write};

use ptree::print_config::UTF_CHARS;
use ptree::{write_tree_with, PrintConfig, Style, TreeItem};

use crate::error::OptResult;
use crate::plan::{Plan, PlanNode};

impl<'a> TreeItem for &'a PlanNode {
    type Child = Self;

    fn write_self<W: Write>(&self, f: &mut W, style: &Style) -> std::io::Result<()> {
        write!(f, "{}", style.paint(self.operator()))
    }

    fn children(&self) -> Cow<[Self::Child]> {
        Cow::from(
            self.inputs()
                .iter()
                .map(|c| &**c)
                .collect::<Vec<&'a PlanNode>>(),
        )
    }
}

pub fn explain<W: Write>(plan: &Plan, output: &mut W) -> std::io::Result<()> {
    let config = PrintConfig {
        indent: 3,
        characters: UTF_CHARS.into(),
        ..Default::default()
    };
    let root = plan.root();
    write_tree_with(&&*root, output, &config)
}

pub fn explain_to_string(plan: &Plan) -> OptResult<String> {
    let mut buf = BufWriter::new(Vec::new());
    explain(plan, &mut buf)?;
    let bytes = buf.into_inner()?;
    Ok(String::from_utf8(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Predicate;
    use crate::operator::JoinSpec;
    use crate::plan::PlanBuilder;

    #[test]
    fn test_explain_filtered_scan() {
        let plan = PlanBuilder::scan("t1")
            .filter(Predicate::parse("t1.c1 = 5").unwrap())
            .limit(10)
            .build();

        let expected = "\
Limit { limit: 10 }
└─ Filter { predicate: t1.c1 = 5 }
   └─ Scan { table_name: \"t1\" }
";
        assert_eq!(explain_to_string(&plan).unwrap(), expected);
    }

    #[test]
    fn test_explain_join() {
        let plan = PlanBuilder::scan("t1")
            .join(
                JoinSpec::Theta(Predicate::parse("t1.c1 = t2.c2").unwrap()),
                PlanBuilder::scan("t2"),
            )
            .build();

        let expected = "\
Join { theta: t1.c1 = t2.c2 }
├─ Scan { table_name: \"t1\" }
└─ Scan { table_name: \"t2\" }
";
        assert_eq!(explain_to_string(&plan).unwrap(), expected);
    }
}
