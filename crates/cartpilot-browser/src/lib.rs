//! DevTools protocol plumbing for cartpilot.
//!
//! Connects to a page target of a running Chromium instance (started with
//! `--remote-debugging-port`) and exposes the small set of page operations
//! the cart controller needs:
//!
//! - Evaluate JavaScript in page context (`Runtime.evaluate`)
//! - Patch text, attributes, and markup of specific elements
//! - Read meta-tag content (CSRF token lookup)
//! - Mirror values into the page's localStorage
//! - Navigate (`Page.navigate`)
//! - Receive page events: load notifications and click-bridge callbacks
//!   (`Runtime.addBinding` / `Runtime.bindingCalled`)
//!
//! # Architecture
//!
//! Two layers:
//!
//! - **`cdp`**: WebSocket client with JSON-RPC 2.0 command/response
//!   correlation. Commands go through a cloneable [`CdpClient`]; events
//!   arrive on a separate [`CdpEventStream`] so one task can patch the page
//!   while another consumes clicks.
//! - **`page`**: [`PageSession`] wrapping the client with evaluate/navigate/
//!   binding operations, plus pure JS expression builders for every DOM
//!   patch the controller performs.
//!
//! Expression builders are plain functions over strings and are unit-tested
//! without a browser.

pub mod cdp;
pub mod error;
pub mod page;
pub mod storage;

pub use cdp::{CdpClient, CdpEvent, CdpEventStream};
pub use error::PageError;
pub use page::{PageEvent, PageEvents, PageSession};
