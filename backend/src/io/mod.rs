//! # IO Module
//!
//! Interfaces through which clients reach the domain. Only REST exists today.

pub mod rest;
