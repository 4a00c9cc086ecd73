#![no_main]

use std::sync::Arc;

use libfuzzer_sys::fuzz_target;
use tempfile::TempDir;
use studentdesk::api::CreateAssignmentRequest;
use studentdesk::service::{AssignmentService, CounterPolicy, NewAssignment};
use studentdesk::storage::RocksDbStore;

fuzz_target!(|data: &[u8]| {
    // Only bodies that deserialize reach the service
    let Ok(req) = serde_json::from_slice::<CreateAssignmentRequest>(data) else {
        return;
    };

    let dir = TempDir::new().unwrap();
    let store = Arc::new(RocksDbStore::open(dir.path()).unwrap());
    let service = AssignmentService::new(store, CounterPolicy::default());

    // Create should succeed or fail cleanly, never panic
    let created = service.create(NewAssignment {
        title: req.title,
        description: req.description,
        due_date: req.due_date,
        unique_no: req.unique_no,
    });

    // A created record must be readable under its number
    if let Ok(assignment) = created {
        let found = service.find(assignment.unique_no).unwrap();
        assert_eq!(found, Some(assignment));
    }
});
