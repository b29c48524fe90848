//! Chessboard photo bot: recognizes the position in a photo, evaluates it
//! with a UCI engine and replies with the FEN, an analysis link and the
//! engine's verdict.

pub mod analyzer;
pub mod app;
pub mod clients;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod recognition;
pub mod routes;
pub mod supervisor;
pub mod transport;
