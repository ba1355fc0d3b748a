//! MeCan: rank chemotherapy drugs by predicted sensitivity for one patient.
//!
//! A gene expression profile is decoded by [`data::loader`], fed through one
//! pre-trained [`model::Predictor`] per drug held in a [`model::Registry`], and
//! the drugs are ordered by predicted IC50 in [`rank`].

pub mod config;
pub mod data;
pub mod model;
pub mod rank;
pub mod state;
