//! Test Helper Utilities
//!
//! Shared fixtures for hjury-ai integration tests

#![allow(dead_code)]

pub mod db_utils;
pub mod stub_inspector;

pub use db_utils::{
    create_test_db, insert_category, insert_hackathon, insert_project, insert_quality_report,
    insert_score_report, insert_technology_report, test_state, test_tuning, ProjectFixture,
    OWNER,
};
pub use stub_inspector::StubInspector;
