use crate::application_port::RelationError;
use crate::domain_model::*;
use std::collections::HashMap;

/// One user record with its relationship lists embedded, in insertion order.
#[derive(Debug, Clone)]
pub struct UserDocument {
    pub profile: UserProfile,
    pub relations: UserRelations,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryState {
    pub users: HashMap<UserId, UserDocument>,
    pub conversations: HashMap<ConversationId, Vec<UserId>>,
    pub direct_pairs: HashMap<UserPair, ConversationId>,
}

impl MemoryState {
    pub fn doc(&self, user_id: UserId) -> Result<&UserDocument, RelationError> {
        self.users.get(&user_id).ok_or(RelationError::UserNotFound)
    }

    pub fn doc_mut(&mut self, user_id: UserId) -> Result<&mut UserDocument, RelationError> {
        self.users.get_mut(&user_id).ok_or(RelationError::UserNotFound)
    }

    pub fn peer_summary(&self, user_id: UserId) -> Option<PeerSummary> {
        self.users.get(&user_id).map(|doc| PeerSummary {
            user_id,
            username: doc.profile.username.clone(),
            display_name: doc.profile.display_name.clone(),
        })
    }

    pub fn peer_summaries(&self, ids: &[UserId], pagination: Pagination) -> (Vec<PeerSummary>, u64) {
        let page = paginate(ids, pagination)
            .into_iter()
            .filter_map(|id| self.peer_summary(id))
            .collect();
        (page, ids.len() as u64)
    }
}

pub fn paginate<T: Clone>(items: &[T], pagination: Pagination) -> Vec<T> {
    let offset = usize::try_from(pagination.offset()).unwrap_or(usize::MAX);
    items
        .iter()
        .skip(offset)
        .take(usize::from(pagination.limit.0))
        .cloned()
        .collect()
}

/// Appends `value` unless an element matching `same` is present.
pub fn push_unique<T>(list: &mut Vec<T>, value: T, same: impl Fn(&T) -> bool) -> bool {
    if list.iter().any(same) {
        return false;
    }
    list.push(value);
    true
}

/// Removes every element matching `pred`; reports whether any was removed.
pub fn pull<T>(list: &mut Vec<T>, pred: impl Fn(&T) -> bool) -> bool {
    let before = list.len();
    list.retain(|item| !pred(item));
    list.len() != before
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_unique_refuses_duplicates() {
        let mut list = vec![1, 2];
        assert!(!push_unique(&mut list, 2, |v| *v == 2));
        assert!(push_unique(&mut list, 3, |v| *v == 3));
        assert_eq!(list, vec![1, 2, 3]);
    }

    #[test]
    fn pull_reports_removal() {
        let mut list = vec![1, 2, 3];
        assert!(pull(&mut list, |v| *v == 2));
        assert!(!pull(&mut list, |v| *v == 2));
        assert_eq!(list, vec![1, 3]);
    }

    #[test]
    fn paginate_keeps_order() {
        let items: Vec<u32> = (0..7).collect();
        assert_eq!(paginate(&items, Pagination::new(2, 3)), vec![3, 4, 5]);
        assert_eq!(paginate(&items, Pagination::new(3, 3)), vec![6]);
        assert!(paginate(&items, Pagination::new(4, 3)).is_empty());
    }
}
