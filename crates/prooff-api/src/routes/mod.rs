//! # API Route Modules
//!
//! | Module           | Prefix              |
//! |------------------|---------------------|
//! | [`anchors`]      | `/v1/anchors`       |
//! | [`certificates`] | `/v1/certificates`  |
//! | [`wallets`]      | `/v1/wallets`       |

pub mod anchors;
pub mod certificates;
pub mod wallets;
