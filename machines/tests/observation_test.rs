use invaders_machines::observation::*;
use invaders_machines::space_invaders::SpaceInvadersSystem;
mod common;
use common::{TestProgram, idle_program};

fn mapped(program: TestProgram) -> SpaceInvadersSystem {
    let mut sys = program.headless();
    sys.set_address_map(Some(INVADERS_MIDWAY));
    sys
}

/// Player in play with `reserve` ships left.
fn in_play(reserve: u8) -> SpaceInvadersSystem {
    let mut sys = mapped(idle_program());
    sys.write_memory(INVADERS_MIDWAY.player_alive, 1);
    sys.write_memory(INVADERS_MIDWAY.reserve_ships, reserve);
    sys
}

// =================================================================
// Address map resolution
// =================================================================

#[test]
fn test_unknown_program_has_no_observations() {
    let sys = idle_program().headless();
    assert!(sys.address_map().is_none());
    match sys.observe() {
        Err(ObservationError::UnknownRevision { checksums }) => {
            assert_eq!(checksums, sys.program_checksums());
        }
        Ok(_) => panic!("synthetic ROM must not match a known revision"),
    }
}

#[test]
fn test_override_and_clear_map() {
    let mut sys = mapped(idle_program());
    assert_eq!(sys.observe().unwrap().map().name, "invaders");
    sys.set_address_map(None);
    assert!(sys.observe().is_err());
}

// =================================================================
// Score and lives
// =================================================================

#[test]
fn test_score_is_bcd() {
    let mut sys = mapped(idle_program());
    sys.write_memory(0x20F8, 0x23);
    sys.write_memory(0x20F9, 0x01);
    assert_eq!(sys.observe().unwrap().score(), 123);

    sys.write_memory(0x20F8, 0x99);
    sys.write_memory(0x20F9, 0x99);
    assert_eq!(sys.observe().unwrap().score(), 9999);
}

#[test]
fn test_lives_counts_ship_in_play() {
    let sys = in_play(2);
    assert_eq!(sys.observe().unwrap().lives(), 3);
}

#[test]
fn test_lives_boundary_at_six() {
    let mut sys = mapped(idle_program());
    sys.write_memory(0x21FF, 6);
    sys.write_memory(0x20E7, 0);
    assert_eq!(sys.observe().unwrap().lives(), 6);

    sys.write_memory(0x20E7, 1);
    assert_eq!(sys.observe().unwrap().lives(), 0, "7 is an impossible read");

    sys.write_memory(0x21FF, 0xFF);
    assert_eq!(sys.observe().unwrap().lives(), 0);
}

// =================================================================
// Game over
// =================================================================

#[test]
fn test_game_over_when_out_of_ships() {
    let mut sys = mapped(idle_program());
    sys.write_memory(0x20E7, 0);
    sys.write_memory(0x21FF, 0);
    assert!(sys.observe().unwrap().is_game_over());
}

#[test]
fn test_not_game_over_with_any_condition_missing() {
    // Alive, no reserve
    let sys = in_play(0);
    assert!(!sys.observe().unwrap().is_game_over());

    // Dead, reserve left
    let mut sys = mapped(idle_program());
    sys.write_memory(0x20E7, 0);
    sys.write_memory(0x21FF, 1);
    assert!(!sys.observe().unwrap().is_game_over());
}

#[test]
fn test_game_over_when_halted() {
    let mut sys = mapped(TestProgram::new().at(0x0001, &[0x76]));
    sys.write_memory(0x20E7, 1);
    sys.write_memory(0x21FF, 2);
    sys.step_frame();
    assert!(sys.is_halted());
    assert!(sys.observe().unwrap().is_game_over());
}

// =================================================================
// Level estimate
// =================================================================

#[test]
fn test_level_from_frame_count() {
    let mut sys = mapped(TestProgram::new().at(0x0001, &[0x76]));
    assert_eq!(sys.observe().unwrap().level(), 1);
    for _ in 0..FRAMES_PER_LEVEL - 1 {
        sys.step_frame();
    }
    assert_eq!(sys.observe().unwrap().level(), 1);
    sys.step_frame();
    assert_eq!(sys.observe().unwrap().level(), 2);
}

// =================================================================
// Entities
// =================================================================

#[test]
fn test_player_position_and_aliens() {
    let mut sys = in_play(2);
    sys.write_memory(0x201B, 0x30);
    sys.write_memory(0x201A, 0x10);
    sys.write_memory(0x2082, 54);
    for i in 0..ALIEN_GRID_LEN as u16 {
        sys.write_memory(0x2100 + i, 1);
    }
    sys.write_memory(0x2100 + 7, 0);

    let obs = sys.observe().unwrap();
    assert_eq!(obs.player_x(), 0x30);
    assert_eq!(obs.player_y(), 0x10);
    assert!(obs.player_alive());
    assert_eq!(obs.alien_count(), 54);

    let grid = obs.alien_grid();
    assert_eq!(grid.iter().filter(|&&alive| alive != 0).count(), 54);
    assert_eq!(grid[7], 0);

    let mut into = [0xEEu8; ALIEN_GRID_LEN];
    obs.alien_grid_into(&mut into);
    assert_eq!(into, grid);
}

#[test]
fn test_shots_active_on_nonzero_y() {
    let mut sys = mapped(idle_program());
    // Player shot: x but no y yet
    sys.write_memory(0x202A, 0x40);
    sys.write_memory(0x2025, 1);
    // Rolling shot in flight
    sys.write_memory(0x203E, 0x50);
    sys.write_memory(0x203D, 0x60);
    // Squiggly shot
    sys.write_memory(0x205E, 0x11);
    sys.write_memory(0x205D, 0x22);

    let obs = sys.observe().unwrap();
    assert_eq!(
        obs.player_shot(),
        ShotState {
            active: false,
            x: 0x40,
            y: 0
        }
    );
    assert_eq!(obs.player_shot_status(), 1);
    assert_eq!(
        obs.rolling_shot(),
        ShotState {
            active: true,
            x: 0x50,
            y: 0x60
        }
    );
    assert!(!obs.plunger_shot().active);
    assert_eq!(
        obs.squiggly_shot(),
        ShotState {
            active: true,
            x: 0x11,
            y: 0x22
        }
    );
}

#[test]
fn test_ufo_position_only_when_active() {
    let mut sys = mapped(idle_program());
    sys.write_memory(0x207C, 0x80);
    sys.write_memory(0x207B, 0xD0);
    assert_eq!(sys.observe().unwrap().ufo(), UfoState::default());

    sys.write_memory(0x2084, 1);
    assert_eq!(
        sys.observe().unwrap().ufo(),
        UfoState {
            active: true,
            x: 0x80,
            y: 0xD0
        }
    );
}

#[test]
fn test_snapshot_matches_accessors() {
    let mut sys = in_play(1);
    sys.write_memory(0x20F8, 0x50);
    sys.write_memory(0x2029, 0x33);
    sys.write_memory(0x2100, 1);
    sys.write_memory(0x2084, 1);

    let obs = sys.observe().unwrap();
    let snap = obs.snapshot();
    assert_eq!(snap.score, 50);
    assert_eq!(snap.lives, 2);
    assert!(!snap.game_over);
    assert_eq!(snap.level, 1);
    assert!(snap.player_alive);
    assert_eq!(snap.alien_grid[0], 1);
    assert!(snap.player_shot.active);
    assert!(snap.ufo.active);
    assert_eq!(snap.ufo, obs.ufo());
}
