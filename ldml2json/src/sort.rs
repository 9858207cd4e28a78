//! Orderings applied to sort groups.

use std::cmp::Ordering;

use crate::{item::Item, node::XPath};

/// Orders the items of a sort group. Sorting is stable, so `Equal` keeps
/// input order.
pub trait ItemComparator: Send + Sync {
    fn compare(&self, a: &Item, b: &Item) -> Ordering;
}

/// Plain lexical order of the untransformed paths.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathComparator;

impl ItemComparator for PathComparator {
    fn compare(&self, a: &Item, b: &Item) -> Ordering {
        a.untransformed_path.cmp(&b.untransformed_path)
    }
}

/// Zone, week and measurement data aware ordering.
#[derive(Debug, Clone, Copy, Default)]
pub struct SemanticComparator;

impl SemanticComparator {
    fn compare_parsed(a: &XPath, b: &XPath) -> Ordering {
        if let (Some(x), Some(y)) = (
            a.find_attribute_value("zone", "type"),
            b.find_attribute_value("zone", "type"),
        ) {
            let mut x = x.splitn(2, '/');
            let mut y = y.splitn(2, '/');
            let result = x.next().cmp(&y.next()).then_with(|| x.next().cmp(&y.next()));
            if result != Ordering::Equal {
                return result;
            }
        }

        let same_group = |group: &str| {
            a.element(1) == Some(group) && a.element(2).is_some() && a.element(2) == b.element(2)
        };
        let territories = || {
            match (
                a.find_first_attribute_value("territories"),
                b.find_first_attribute_value("territories"),
            ) {
                (Some(x), Some(y)) => x.cmp(y),
                _ => Ordering::Equal,
            }
        };

        if same_group("weekData") {
            return territories();
        }
        if same_group("measurementData") {
            let category = |p: &XPath| {
                p.find_attribute_value("measurementSystem", "category")
                    .unwrap_or_default()
                    .to_string()
            };
            return category(a).cmp(&category(b)).then_with(territories);
        }
        Ordering::Equal
    }
}

impl ItemComparator for SemanticComparator {
    fn compare(&self, a: &Item, b: &Item) -> Ordering {
        let semantic = match (
            XPath::parse(&a.untransformed_full_path),
            XPath::parse(&b.untransformed_full_path),
        ) {
            (Ok(x), Ok(y)) => Self::compare_parsed(&x, &y),
            _ => Ordering::Equal,
        };
        semantic.then_with(|| a.untransformed_path.cmp(&b.untransformed_path))
    }
}
