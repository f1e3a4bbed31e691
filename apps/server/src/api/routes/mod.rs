//! Route tables

pub mod catalog;
