//! Message formatting utilities for terminal display.

/// Message formatter for client display
pub struct MessageFormatter;

impl MessageFormatter {
    /// Format the full roster broadcast, marking the current user
    pub fn format_roster(users: &[String], current_username: &str) -> String {
        let mut output = String::new();
        output.push_str("\n------------------------------------------------------------\n");
        output.push_str("Online:\n");

        if users.is_empty() {
            output.push_str("(nobody)\n");
        } else {
            for user in users {
                let me_suffix = if user == current_username { " (me)" } else { "" };
                output.push_str(&format!("  {}{}\n", user, me_suffix));
            }
        }

        output.push_str("------------------------------------------------------------\n");
        output
    }

    /// Format the private welcome greeting
    pub fn format_welcome(message: &str) -> String {
        format!("\n{}\n", message)
    }

    /// Format a user-joined notification
    pub fn format_user_joined(username: &str) -> String {
        format!("\n+ {} joined\n", username)
    }

    /// Format a user-left notification
    pub fn format_user_left(username: &str) -> String {
        format!("\n- {} left\n", username)
    }

    /// Format an incoming chat message with its relay timestamp
    pub fn format_chat_message(username: &str, message: &str, timestamp: &str) -> String {
        format!("\n[{}] {}: {}\n", timestamp, username, message)
    }

    /// Format a raw text frame (when parsing fails)
    pub fn format_raw_message(text: &str) -> String {
        format!("\n← Received: {}\n", text)
    }
}
