//! Model-checked scheduler scenarios. Under `--cfg loom` every test body is
//! explored exhaustively; otherwise the same bodies run once on real
//! threads. The grid's per-cell `UnsafeCell`s double as the race oracle:
//! any admission bug shows up as a tracked concurrent access.

mod util;

use util::sync::Arc;
use util::thread;
use twistlock::{CancelToken, CubeError};

#[test]
fn writer_excludes_reader() {
    util::maybe_loom_model(|| {
        let cube = Arc::new(twistlock::new(1).unwrap());

        let writer = {
            let cube = Arc::clone(&cube);
            thread::spawn(move || cube.rotate(0, 0).unwrap())
        };

        // Before or after the turn, never in between.
        let state = cube.show().unwrap();
        assert!(state == "012345" || state == "023415", "torn read: {state}");

        writer.join().unwrap();
        assert_eq!(cube.show().unwrap(), "023415");
    });
}

#[test]
fn compatible_writers_commute() {
    util::maybe_loom_model(|| {
        let cube = Arc::new(twistlock::new(2).unwrap());

        let top = {
            let cube = Arc::clone(&cube);
            thread::spawn(move || cube.rotate(0, 0).unwrap())
        };
        let bottom = {
            let cube = Arc::clone(&cube);
            thread::spawn(move || cube.rotate(5, 0).unwrap())
        };

        top.join().unwrap();
        bottom.join().unwrap();

        // The two turns permute disjoint cells, so every interleaving,
        // including a genuinely parallel one, yields the same state.
        assert_eq!(cube.show().unwrap(), "000022443311442211335555");
    });
}

#[test]
fn cancellation_cannot_deadlock() {
    util::maybe_loom_model(|| {
        let cube = Arc::new(twistlock::new(1).unwrap());
        let token = CancelToken::new();

        let canceller = {
            let token = token.clone();
            thread::spawn(move || token.cancel())
        };
        let reader = {
            let cube = Arc::clone(&cube);
            let token = token.clone();
            thread::spawn(move || match cube.show_cancellable(&token) {
                Ok(state) => assert!(state == "012345" || state == "215304"),
                Err(error) => assert!(matches!(error, CubeError::Cancelled)),
            })
        };

        cube.rotate(3, 0).unwrap();

        canceller.join().unwrap();
        reader.join().unwrap();

        assert_eq!(cube.show().unwrap(), "215304");
    });
}
