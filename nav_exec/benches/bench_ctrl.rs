//! # Control Tick Benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use comms_if::interrupt::Interrupt;
use nav_lib::{
    ctrl::{CtrlParams, Gains, Limits, Regulator},
    homing::{AlignmentLoop, HomingParams},
    loc::Pose2D,
    per::CameraMode,
    sim::{SimParams, SimRover},
    waypoint::{WaypointCtrl, WaypointParams},
};

fn ctrl_benchmark(c: &mut Criterion) {
    // ---- Single regulator update ----

    let mut regulator = Regulator::new(Gains::new(5.0, 0.1, 0.01), Limits::symmetric(1.0));

    c.bench_function("Regulator::compute", |b| {
        b.iter(|| regulator.compute(black_box(0.3), black_box(0.05)))
    });

    // ---- Waypoint control law ----

    let mut waypoint = WaypointCtrl::new(WaypointParams::default());
    waypoint.set_target(2.0, 1.5);
    let pose = Pose2D::new(0.3, -0.2, 0.1);

    c.bench_function("WaypointCtrl::compute", |b| {
        b.iter(|| waypoint.compute(black_box(&pose), black_box(1.0 / 60.0)))
    });

    // ---- Full alignment run against the simulator ----

    let ctrl_params = CtrlParams {
        realtime: false,
        ..Default::default()
    };
    let sim_params = SimParams {
        initial_pose: Pose2D::new(0.0, 0.0, -1.0),
        ..SimParams::default()
    };

    c.bench_function("CtrlExec::run::alignment", |b| {
        b.iter(|| {
            let (_sim, mut exec) =
                SimRover::with_exec(sim_params.clone(), ctrl_params.clone(), || Interrupt::Fine)
                    .unwrap();
            let mut align = AlignmentLoop::new(&HomingParams::default(), CameraMode::Sim);
            exec.run(&mut align).unwrap()
        })
    });
}

criterion_group!(benches, ctrl_benchmark);
criterion_main!(benches);
