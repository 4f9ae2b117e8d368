//! Local assistant chat. Replies come from a fixed set; nothing leaves the
//! client.

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;

use xpaio_common::session::Session;

use crate::error::ClientError;

const CANNED_REPLIES: &[&str] = &[
    "Tokens on the test network are free to experiment with. Try the form on the right.",
    "Total supply is fixed at issuance, so pick a number you are happy with.",
    "Decimals default to 18. Lower values make amounts easier to read.",
    "Your issuer and distributor wallets must be different accounts.",
    "Payments go through your wallet app; approve them there to continue.",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub id: u64,
    pub text: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ChatBot {
    messages: Vec<ChatMessage>,
    next_id: u64,
    thinking: bool,
}

impl ChatBot {
    pub fn new(welcome: &str) -> Self {
        let mut bot = Self {
            messages: Vec::new(),
            next_id: 1,
            thinking: false,
        };
        bot.push(Sender::Assistant, welcome.to_string());
        bot
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// True between [`ChatBot::submit`] and [`ChatBot::reply`].
    pub fn is_thinking(&self) -> bool {
        self.thinking
    }

    /// Append the user's message and start thinking. Only signed-in users
    /// can chat; blank input is refused.
    pub fn submit(&mut self, session: &Session, input: &str) -> Result<(), ClientError> {
        if !session.is_authenticated {
            return Err(ClientError::NotAuthenticated);
        }
        let text = input.trim();
        if text.is_empty() {
            return Err(ClientError::InvalidInput("message is empty".into()));
        }
        if self.thinking {
            return Err(ClientError::InvalidInput("still answering the last message".into()));
        }
        self.push(Sender::User, text.to_string());
        self.thinking = true;
        Ok(())
    }

    /// Finish thinking with a canned reply.
    pub fn reply(&mut self) -> &ChatMessage {
        let text = CANNED_REPLIES
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or("I'm not sure about that one.");
        self.thinking = false;
        self.push(Sender::Assistant, text.to_string())
    }

    /// Stop thinking without replying. The user's message stays.
    pub fn abandon_reply(&mut self) {
        self.thinking = false;
    }

    fn push(&mut self, sender: Sender, text: String) -> &ChatMessage {
        let id = self.next_id;
        self.next_id += 1;
        self.messages.push(ChatMessage {
            id,
            text,
            sender,
            timestamp: Utc::now(),
        });
        &self.messages[self.messages.len() - 1]
    }
}
