//! Per-user AI conversation context. Lives only as long as the process.

use crate::models::ChatTurn;
use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct ConversationHistory {
    turns: Arc<DashMap<u64, VecDeque<ChatTurn>>>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, user_id: u64) -> Vec<ChatTurn> {
        self.turns
            .get(&user_id)
            .map(|t| t.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Append a turn, dropping the oldest ones beyond `limit`
    pub fn push(&self, user_id: u64, turn: ChatTurn, limit: usize) {
        let mut turns = self.turns.entry(user_id).or_default();
        turns.push_back(turn);
        while turns.len() > limit {
            turns.pop_front();
        }
    }

    /// Returns how many turns were dropped
    pub fn clear(&self, user_id: u64) -> usize {
        self.turns
            .remove(&user_id)
            .map(|(_, t)| t.len())
            .unwrap_or(0)
    }

    pub fn len(&self, user_id: u64) -> usize {
        self.turns.get(&user_id).map(|t| t.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_is_bounded() {
        let history = ConversationHistory::new();
        for i in 0..5 {
            history.push(7, ChatTurn::user(format!("msg {i}")), 3);
        }

        let turns = history.get(7);
        assert_eq!(turns.len(), 3);
        assert_eq!(turns[0].content, "msg 2");
        assert_eq!(turns[2].content, "msg 4");
    }

    #[test]
    fn test_history_is_per_user() {
        let history = ConversationHistory::new();
        history.push(1, ChatTurn::user("hi"), 10);
        history.push(2, ChatTurn::user("hello"), 10);

        assert_eq!(history.clear(1), 1);
        assert!(history.get(1).is_empty());
        assert_eq!(history.len(2), 1);
    }
}
