//! The group table: priority group id → handlers in insertion order.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::RegistrationError;
use crate::handlers::Handler;

pub const DEFAULT_GROUP: i32 = 0;

/// Lower group ids are visited first; within a group, insertion order. A handler (by `Arc`
/// identity) appears at most once per group but may sit in several groups.
#[derive(Debug, Default, Clone)]
pub struct HandlerGroups {
    groups: BTreeMap<i32, Vec<Arc<Handler>>>,
}

impl HandlerGroups {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, handler: Arc<Handler>, group: i32) -> Result<(), RegistrationError> {
        if self.contains(&handler, group) {
            return Err(RegistrationError::DuplicateHandler(group));
        }
        self.groups.entry(group).or_default().push(handler);
        Ok(())
    }

    /// Adds every handler to one group, or none of them.
    pub fn add_many<I>(&mut self, handlers: I, group: i32) -> Result<(), RegistrationError>
    where
        I: IntoIterator<Item = Arc<Handler>>,
    {
        self.add_grouped(handlers.into_iter().map(|h| (group, h)))
    }

    /// Adds `(group, handler)` pairs, or none of them. Duplicates against the table or
    /// within the batch fail the whole call.
    pub fn add_grouped<I>(&mut self, batch: I) -> Result<(), RegistrationError>
    where
        I: IntoIterator<Item = (i32, Arc<Handler>)>,
    {
        let batch: Vec<(i32, Arc<Handler>)> = batch.into_iter().collect();
        for (index, (group, handler)) in batch.iter().enumerate() {
            let seen_in_batch = batch[..index]
                .iter()
                .any(|(g, h)| g == group && Arc::ptr_eq(h, handler));
            if seen_in_batch || self.contains(handler, *group) {
                return Err(RegistrationError::DuplicateHandler(*group));
            }
        }
        for (group, handler) in batch {
            self.groups.entry(group).or_default().push(handler);
        }
        Ok(())
    }

    /// Removes by identity; an emptied group is dropped from the table.
    pub fn remove(&mut self, handler: &Arc<Handler>, group: i32) -> Result<(), RegistrationError> {
        let handlers = self
            .groups
            .get_mut(&group)
            .ok_or(RegistrationError::UnknownGroup(group))?;
        let position = handlers
            .iter()
            .position(|h| Arc::ptr_eq(h, handler))
            .ok_or(RegistrationError::HandlerNotInGroup(group))?;
        handlers.remove(position);
        if handlers.is_empty() {
            self.groups.remove(&group);
        }
        Ok(())
    }

    pub fn contains(&self, handler: &Arc<Handler>, group: i32) -> bool {
        self.groups
            .get(&group)
            .is_some_and(|handlers| handlers.iter().any(|h| Arc::ptr_eq(h, handler)))
    }

    pub fn get(&self, group: i32) -> Option<&[Arc<Handler>]> {
        self.groups.get(&group).map(Vec::as_slice)
    }

    /// Group ids in ascending order.
    pub fn groups(&self) -> Vec<i32> {
        self.groups.keys().copied().collect()
    }

    /// Total handler registrations across all groups.
    pub fn len(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Dispatch order copy, so registration may change while an update is processed.
    pub fn snapshot(&self) -> Vec<(i32, Vec<Arc<Handler>>)> {
        self.groups
            .iter()
            .map(|(group, handlers)| (*group, handlers.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::{Callback, Flow, PollHandler};

    fn handler() -> Arc<Handler> {
        Arc::new(Handler::new(
            PollHandler,
            Callback::new(|_, _| async { Ok(Flow::Continue) }),
        ))
    }

    #[test]
    fn test_groups_are_ordered_ascending() {
        let mut table = HandlerGroups::new();
        table.add(handler(), 5).unwrap();
        table.add(handler(), -1).unwrap();
        table.add(handler(), DEFAULT_GROUP).unwrap();
        assert_eq!(table.groups(), vec![-1, 0, 5]);
    }

    #[test]
    fn test_duplicate_in_group_rejected_but_other_group_allowed() {
        let mut table = HandlerGroups::new();
        let h = handler();
        table.add(h.clone(), 0).unwrap();
        assert!(matches!(
            table.add(h.clone(), 0),
            Err(RegistrationError::DuplicateHandler(0))
        ));
        table.add(h.clone(), 1).unwrap();
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_bulk_add_is_all_or_nothing() {
        let mut table = HandlerGroups::new();
        let existing = handler();
        table.add(existing.clone(), 2).unwrap();

        let result = table.add_grouped(vec![(0, handler()), (1, handler()), (2, existing)]);
        assert!(result.is_err());
        assert_eq!(table.groups(), vec![2]);
        assert_eq!(table.len(), 1);

        let h = handler();
        assert!(table.add_many(vec![h.clone(), h], 3).is_err());
        assert!(table.get(3).is_none());
    }

    #[test]
    fn test_remove_drops_empty_group() {
        let mut table = HandlerGroups::new();
        let (a, b) = (handler(), handler());
        table.add(a.clone(), 1).unwrap();

        assert!(matches!(table.remove(&a, 9), Err(RegistrationError::UnknownGroup(9))));
        assert!(matches!(table.remove(&b, 1), Err(RegistrationError::HandlerNotInGroup(1))));

        table.remove(&a, 1).unwrap();
        assert!(table.is_empty());
        table.add(b.clone(), 1).unwrap();
        assert_eq!(table.get(1).map(<[_]>::len), Some(1));
    }
}
