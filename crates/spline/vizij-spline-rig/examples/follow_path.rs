//! Walk a follower along a fixture path and print its poses.
//!
//! Run with `cargo run -p vizij-spline-rig --example follow_path -- s_curve`.

use anyhow::{Context, Result};
use vizij_spline_core::{SplineConfig, WaypointStore};
use vizij_spline_rig::{FacingMode, FollowerConfig, PathFollower, PathSeed};
use vizij_test_fixtures::paths;

fn main() -> Result<()> {
    let name = std::env::args().nth(1).unwrap_or_else(|| "s_curve".to_string());
    let seed: PathSeed = paths::load(&name)?;

    let mut store = WaypointStore::with_config(SplineConfig {
        lookahead_delta: 0.1,
        ..SplineConfig::default()
    });
    seed.apply(&mut store)
        .with_context(|| format!("failed to seed path '{name}'"))?;
    println!("{}", store.timing_report());

    let mut follower = PathFollower::attach(
        &mut store,
        FollowerConfig {
            speed: 0.2,
            facing: FacingMode::Lookahead,
        },
    );
    while let Some(pose) = follower.advance(&store, 0.25)? {
        let p = pose.position;
        let (roll, pitch, yaw) = pose.orientation.euler_angles();
        println!(
            "t={:.3} pos=({:.3}, {:.3}, {:.3}) rpy=({:.3}, {:.3}, {:.3})",
            pose.time, p.x, p.y, p.z, roll, pitch, yaw
        );
        if pose.at_limit {
            break;
        }
    }

    let mid = follower.limit() * 0.5;
    println!("{}", store.evaluator().position_breakdown(mid)?);
    Ok(())
}
