//! Event types for the TUI event loop.

use crossterm::event::KeyEvent;
use shopfront_client::mutation::Notice;
use shopfront_client::session::SessionEvent;

#[derive(Debug, Clone)]
pub enum ShopEvent {
    Input(KeyEvent),
    Resize { width: u16, height: u16 },
    /// Terminal gained (true) or lost (false) focus.
    Focus(bool),
    Session(SessionEvent),
    Notice(Notice),
}
