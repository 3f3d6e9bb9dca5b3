//! End-to-end stop/resume scenarios driving a real (if tiny) target
//! through [`TargetController`].

use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};

use cwdbg::{TargetController, TargetRecord};
use cwdbg_core::TargetState;

static FILE_COUNTER: AtomicU32 = AtomicU32::new(0);

fn write_image(code: &[u8]) -> PathBuf {
    let mut bytes = (code.len() as u16).to_be_bytes().to_vec();
    bytes.extend_from_slice(code);

    let id = FILE_COUNTER.fetch_add(1, Ordering::Relaxed);
    let path = std::env::temp_dir().join(format!("cwdbg-scenario-{}-{}.bin", std::process::id(), id));
    std::fs::write(&path, bytes).expect("failed to write scratch image");
    path
}

const NOP: [u8; 2] = [0x4E, 0x71];
const RTS: [u8; 2] = [0x4E, 0x75];
const ILLEGAL: [u8; 2] = [0x4A, 0xFC];

/// Scenario 1: a breakpoint on the second instruction is hit once, then
/// continuing runs the target to completion.
#[test]
fn breakpoint_hit_then_continue_runs_to_exit() {
    let path = write_image(&[NOP, NOP, RTS].concat());
    let mut controller = TargetController::new();
    controller.load(&path).unwrap();
    let entry_point = controller.record().entry_point();
    controller.set_breakpoint(2).unwrap();

    let mut hit_count = 0;
    let mut frontend = |record: &mut TargetRecord| {
        hit_count += 1;
        let info = record.target_info();
        assert!(info.state.contains(TargetState::STOPPED_BY_BREAKPOINT));
        assert_eq!(info.context.unwrap().pc, entry_point + 2);
        assert_eq!(info.active_breakpoint.unwrap().hit_count, 1);
    };
    controller.run(&mut frontend).unwrap();

    assert_eq!(hit_count, 1);
    let info = controller.target_info();
    assert!(info.state.contains(TargetState::EXITED));
    assert_eq!(info.exit_code, Some(0));

    let _ = std::fs::remove_file(&path);
}

/// Scenario 2: switching to single-step mode from inside the breakpoint
/// handler steps exactly one instruction past the disarmed breakpoint site
/// before the next stop.
#[test]
fn single_step_after_breakpoint_hit_advances_one_instruction() {
    let path = write_image(&[NOP, NOP, RTS].concat());
    let mut controller = TargetController::new();
    controller.load(&path).unwrap();
    let entry_point = controller.record().entry_point();
    controller.set_breakpoint(2).unwrap();

    let mut stops = Vec::new();
    let mut frontend = |record: &mut TargetRecord| {
        let info = record.target_info();
        stops.push((info.state, info.context.map(|c| c.pc)));
        if info.state.contains(TargetState::STOPPED_BY_BREAKPOINT) {
            record.set_single_step_mode();
        }
    };
    controller.run(&mut frontend).unwrap();

    assert_eq!(stops.len(), 2);
    assert!(stops[0].0.contains(TargetState::STOPPED_BY_BREAKPOINT));
    assert_eq!(stops[0].1, Some(entry_point + 2));
    assert!(stops[1].0.contains(TargetState::STOPPED_BY_SINGLE_STEP));
    assert_eq!(stops[1].1, Some(entry_point + 4));

    let info = controller.target_info();
    assert!(info.state.contains(TargetState::EXITED));

    let _ = std::fs::remove_file(&path);
}

/// Scenario 3: a one-shot breakpoint fires once and is gone from the table
/// afterward, with execution continuing normally through it.
#[test]
fn one_shot_breakpoint_fires_once_and_is_removed() {
    let path = write_image(&[NOP, NOP, RTS].concat());
    let mut controller = TargetController::new();
    controller.load(&path).unwrap();
    controller.set_one_shot_breakpoint(2).unwrap();

    let mut hit_count = 0;
    let mut frontend = |record: &mut TargetRecord| {
        hit_count += 1;
        let info = record.target_info();
        assert!(info.state.contains(TargetState::STOPPED_BY_ONE_SHOT_BREAKPOINT));
        assert!(info.active_breakpoint.is_none());
    };
    controller.run(&mut frontend).unwrap();

    assert_eq!(hit_count, 1);
    let info = controller.target_info();
    assert!(info.state.contains(TargetState::EXITED));

    let _ = std::fs::remove_file(&path);
}

/// Scenario 4: an illegal opcode raises an exception stop with the program
/// counter left at the faulting instruction, not past it.
#[test]
fn illegal_instruction_raises_exception_stop() {
    let path = write_image(&[NOP, ILLEGAL].concat());
    let mut controller = TargetController::new();
    controller.load(&path).unwrap();
    let entry_point = controller.record().entry_point();

    let mut hit_count = 0;
    let mut frontend = |record: &mut TargetRecord| {
        hit_count += 1;
        let info = record.target_info();
        assert!(info.state.contains(TargetState::STOPPED_BY_EXCEPTION));
        assert_eq!(info.context.unwrap().pc, entry_point + 2);
        record.kill();
    };
    controller.run(&mut frontend).unwrap();

    assert_eq!(hit_count, 1);
    assert!(controller.target_info().state.contains(TargetState::KILLED));

    let _ = std::fs::remove_file(&path);
}

/// Scenario 6: clearing one of two breakpoints leaves the other armed and
/// the cleared site's original opcode intact.
#[test]
fn clearing_one_breakpoint_leaves_the_other_armed() {
    let path = write_image(&[NOP, NOP, NOP, RTS].concat());
    let mut controller = TargetController::new();
    controller.load(&path).unwrap();
    let entry_point = controller.record().entry_point();

    let first = controller.set_breakpoint(0).unwrap();
    controller.set_breakpoint(2).unwrap();
    controller.clear_breakpoint(first).unwrap();

    let mut hit_count = 0;
    let mut frontend = |record: &mut TargetRecord| {
        hit_count += 1;
        let info = record.target_info();
        assert_eq!(info.context.unwrap().pc, entry_point + 2);
    };
    controller.run(&mut frontend).unwrap();

    assert_eq!(hit_count, 1, "the cleared breakpoint must not fire");
    let info = controller.target_info();
    assert!(info.state.contains(TargetState::EXITED));

    let _ = std::fs::remove_file(&path);
}
