//! Tests the single-threaded behavior of the cube: move semantics,
//! serialization, argument validation and hook ordering.

mod util;

use rand::Rng;
use std::sync::Mutex;
use twistlock::CubeError;
use util::{assert_balanced, SOLVED_1, SOLVED_2, SOLVED_3};

#[test]
fn fresh_cube_is_solved() {
    assert_eq!(twistlock::new(1).unwrap().show().unwrap(), SOLVED_1);
    assert_eq!(twistlock::new(2).unwrap().show().unwrap(), SOLVED_2);
    assert_eq!(twistlock::new(3).unwrap().show().unwrap(), SOLVED_3);
}

#[test]
fn right_turn_from_solved() {
    let cube = twistlock::new(3).unwrap();
    cube.rotate(3, 0).unwrap();
    assert_eq!(
        cube.show().unwrap(),
        "002002002111111111225225225333333333044044044554554554"
    );
}

#[test]
fn whole_cube_turn_on_size_one() {
    let cube = twistlock::new(1).unwrap();
    // The single layer is the whole cube; turning side 3 carries the front
    // face to the top.
    cube.rotate(3, 0).unwrap();
    assert_eq!(cube.show().unwrap(), "215304");

    let cube = twistlock::new(1).unwrap();
    cube.rotate(0, 0).unwrap();
    assert_eq!(cube.show().unwrap(), "023415");
}

#[test]
fn four_turns_are_identity() {
    for size in 1..=4 {
        let cube = twistlock::new(size).unwrap();
        // Scramble first so the check is not about the solved state's
        // symmetry.
        cube.rotate(2, 0).unwrap();
        cube.rotate(0, size - 1).unwrap();
        let before = cube.show().unwrap();

        for side in 0..cube.num_sides() {
            for layer in 0..size {
                for _ in 0..4 {
                    cube.rotate(side, layer).unwrap();
                }
                assert_eq!(
                    cube.show().unwrap(),
                    before,
                    "size {size} side {side} layer {layer}"
                );
            }
        }
    }
}

#[test]
fn opposite_face_equivalence() {
    // rotate(side, n-1) is three clockwise turns of the opposite face.
    let size = 3;
    let opposite = [5, 3, 4, 1, 2, 0];

    for side in 0..6 {
        let a = twistlock::new(size).unwrap();
        let b = twistlock::new(size).unwrap();
        for cube in [&a, &b] {
            cube.rotate(1, 1).unwrap();
            cube.rotate(4, 0).unwrap();
        }

        a.rotate(side, size - 1).unwrap();
        for _ in 0..3 {
            b.rotate(opposite[side], 0).unwrap();
        }

        assert_eq!(a.show().unwrap(), b.show().unwrap(), "side {side}");
    }
}

#[test]
fn fixed_sequence_has_order_1260() {
    const SEQUENCE: [(usize, usize); 10] = [
        (3, 0),
        (0, 0),
        (0, 0),
        (5, 0),
        (5, 0),
        (5, 0),
        (4, 0),
        (5, 0),
        (5, 0),
        (5, 0),
    ];

    for size in 1..=3 {
        let cube = twistlock::new(size).unwrap();
        let solved = cube.show().unwrap();

        for _ in 0..1260 {
            for (side, layer) in SEQUENCE {
                cube.rotate(side, layer).unwrap();
            }
        }

        assert_eq!(cube.show().unwrap(), solved, "size {size}");
    }
}

#[test]
fn random_moves_keep_colors_balanced() {
    let mut rng = rand::thread_rng();

    for size in [2, 3, 5] {
        let cube = twistlock::new(size).unwrap();
        for _ in 0..200 {
            let side = rng.gen_range(0..6);
            let layer = rng.gen_range(0..size);
            cube.rotate(side, layer).unwrap();
        }
        assert_balanced(&cube.show().unwrap(), size);
    }
}

#[test]
fn arguments_are_validated() {
    let cube = twistlock::new(3).unwrap();

    assert_eq!(
        cube.rotate(6, 0),
        Err(CubeError::InvalidArgument {
            argument: "side",
            value: 6,
        })
    );
    assert_eq!(
        cube.rotate(0, 3),
        Err(CubeError::InvalidArgument {
            argument: "layer",
            value: 3,
        })
    );
    assert_eq!(
        twistlock::new(0).unwrap_err(),
        CubeError::InvalidArgument {
            argument: "size",
            value: 0,
        }
    );

    // A rejected call leaves the cube untouched.
    assert_eq!(cube.show().unwrap(), SOLVED_3);
}

#[test]
fn constants() {
    let cube = twistlock::new(7).unwrap();
    assert_eq!(cube.num_sides(), 6);
    assert_eq!(cube.size(), 7);
    assert_eq!(cube.show().unwrap().len(), 6 * 7 * 7);
}

#[test]
fn hooks_run_in_order_around_the_body() {
    let log = std::sync::Arc::new(Mutex::new(Vec::new()));

    let cube = {
        let (a, b, c, d) = (log.clone(), log.clone(), log.clone(), log.clone());
        twistlock::Builder::new()
            .size(2)
            .before_rotate(move |side, layer| a.lock().unwrap().push(format!("br {side} {layer}")))
            .after_rotate(move |side, layer| b.lock().unwrap().push(format!("ar {side} {layer}")))
            .before_show(move || c.lock().unwrap().push("bs".to_owned()))
            .after_show(move || d.lock().unwrap().push("as".to_owned()))
            .build()
            .unwrap()
    };

    cube.rotate(4, 1).unwrap();
    cube.show().unwrap();
    cube.rotate(2, 0).unwrap();

    assert_eq!(
        *log.lock().unwrap(),
        vec!["br 4 1", "ar 4 1", "bs", "as", "br 2 0", "ar 2 0"]
    );
}

#[test]
fn hooks_do_not_run_for_rejected_arguments() {
    let log = std::sync::Arc::new(Mutex::new(Vec::<String>::new()));

    let cube = {
        let a = log.clone();
        twistlock::Builder::new()
            .size(2)
            .before_rotate(move |side, layer| a.lock().unwrap().push(format!("br {side} {layer}")))
            .build()
            .unwrap()
    };

    assert!(cube.rotate(0, 2).is_err());
    assert!(log.lock().unwrap().is_empty());
}
