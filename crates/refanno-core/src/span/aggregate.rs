use super::block::Block;

/// Two or more blocks whose ranges overlap, grouped for a review view.
///
/// Borrows from the span list it was built from and is never stored in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregate<'a> {
    pub start: usize,
    pub end: usize,
    pub blocks: Vec<&'a Block>,
}

impl Aggregate<'_> {
    /// Distinct label names in the group, in block order.
    #[must_use]
    pub fn label_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for block in &self.blocks {
            let name = block.label_name();
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }
}

/// Group overlapping blocks into aggregates.
///
/// `blocks` must be sorted by start. Singletons are dropped.
pub(crate) fn group_overlapping<'a>(blocks: &[&'a Block]) -> Vec<Aggregate<'a>> {
    let mut groups = Vec::new();
    let mut current: Option<Aggregate<'a>> = None;

    for &block in blocks {
        match current.as_mut() {
            Some(group) if block.start() < group.end => {
                group.end = group.end.max(block.end());
                group.blocks.push(block);
            }
            _ => {
                if let Some(done) = current.take() {
                    if done.blocks.len() > 1 {
                        groups.push(done);
                    }
                }
                current = Some(Aggregate {
                    start: block.start(),
                    end: block.end(),
                    blocks: vec![block],
                });
            }
        }
    }
    if let Some(done) = current {
        if done.blocks.len() > 1 {
            groups.push(done);
        }
    }
    groups
}
