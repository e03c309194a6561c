//! This crate provides a client for the PakBus/BMP5 wire protocol used by
//! Campbell Scientific dataloggers.
//!
//! # Examples
//! ```no_run
//! use pakbus::{client::Client, tcp};
//!
//! let t = tcp::Transport::connect(tcp::Options::new("10.0.0.5")).unwrap();
//! let mut cl = Client::new(t, 0x001, 0x002);
//! cl.ping().unwrap();
//! let tabledef = cl.get_table_defs().unwrap();
//! let (records, _more) = cl
//!     .collect_data(&tabledef, "Public", &[], 0x05, (1, 0), (0, 0))
//!     .unwrap();
//! cl.bye().unwrap();
//! ```
pub mod client;
pub mod codec;
pub mod constant;
pub mod error;
pub mod framer;
pub mod header;
pub mod message;
pub mod mux;
pub mod tabledef;
pub mod tcp;
pub mod transport;
