//! Orchestration for readmepulse.
//!
//! Ties the source clients and the patcher together: derives the streak,
//! renders values into document text, runs the read/fetch/patch/write cycle
//! and hands the result to a [`publish::Publisher`].

pub mod document;
pub mod pipeline;
pub mod publish;
pub mod render;
pub mod streak;
