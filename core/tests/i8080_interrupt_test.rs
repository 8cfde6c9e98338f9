use invaders_core::cpu::i8080::{I8080, INTERRUPT_CYCLES};
use invaders_core::cpu::{Cpu, CpuStateTrait, I8080State};
mod common;
use common::{MASTER, TestBus};

fn run_instruction(cpu: &mut I8080, bus: &mut TestBus) -> u32 {
    cpu.step(bus, MASTER)
}

// ============================================================
// Machine control
// ============================================================

#[test]
fn test_nop_aliases() {
    let mut cpu = I8080::new();
    let mut bus = TestBus::new();
    bus.load(0, &[0x00, 0x08, 0x10, 0x18, 0x20, 0x28, 0x30, 0x38]);

    for i in 0..8 {
        assert_eq!(run_instruction(&mut cpu, &mut bus), 4);
        assert_eq!(cpu.pc, i + 1);
    }
    assert_eq!(cpu.f, 0x02);
}

#[test]
fn test_hlt_stops_fetching() {
    let mut cpu = I8080::new();
    let mut bus = TestBus::new();
    bus.load(0, &[0x76, 0x3C]); // HLT; INR A

    assert_eq!(run_instruction(&mut cpu, &mut bus), 7);
    assert!(cpu.halted);
    assert!(cpu.is_sleeping());
    assert_eq!(cpu.pc, 1);

    assert_eq!(run_instruction(&mut cpu, &mut bus), 0);
    assert_eq!(cpu.a, 0, "halted CPU must not execute");
    assert_eq!(cpu.pc, 1);
}

#[test]
fn test_ei_di() {
    let mut cpu = I8080::new();
    let mut bus = TestBus::new();
    bus.load(0, &[0xFB, 0xF3]); // EI; DI

    assert_eq!(run_instruction(&mut cpu, &mut bus), 4);
    assert!(cpu.inte);
    assert_eq!(run_instruction(&mut cpu, &mut bus), 4);
    assert!(!cpu.inte);
}

// ============================================================
// Burst execution
// ============================================================

#[test]
fn test_execute_runs_until_budget_reached() {
    let mut cpu = I8080::new();
    let mut bus = TestBus::new();
    // Memory is all NOPs.

    let consumed = cpu.execute(&mut bus, MASTER, 10);
    assert_eq!(consumed, 12, "three 4-cycle NOPs reach the budget");
    assert_eq!(cpu.pc, 3);
}

#[test]
fn test_execute_overshoots_by_partial_instruction() {
    let mut cpu = I8080::new();
    let mut bus = TestBus::new();
    bus.load(0, &[0x00, 0xCD, 0x00, 0x10]); // NOP; CALL 1000
    cpu.sp = 0x2400;

    let consumed = cpu.execute(&mut bus, MASTER, 5);
    assert_eq!(consumed, 21);
    assert_eq!(cpu.pc, 0x1000);
}

#[test]
fn test_execute_stops_at_halt() {
    let mut cpu = I8080::new();
    let mut bus = TestBus::new();
    bus.load(0, &[0x00, 0x76]); // NOP; HLT

    let consumed = cpu.execute(&mut bus, MASTER, 1000);
    assert_eq!(consumed, 11);
    assert!(cpu.halted);
}

#[test]
fn test_execute_while_halted_idles_full_budget() {
    let mut cpu = I8080::new();
    let mut bus = TestBus::new();
    cpu.halted = true;

    assert_eq!(cpu.execute(&mut bus, MASTER, 17066), 17066);
    assert_eq!(cpu.pc, 0);
}

// ============================================================
// Interrupts
// ============================================================

#[test]
fn test_masked_interrupt_is_dropped() {
    let mut cpu = I8080::new();
    let mut bus = TestBus::new();
    cpu.pc = 0x1234;
    cpu.sp = 0x2400;

    assert!(!cpu.interrupt(&mut bus, MASTER, 0x0008));
    assert_eq!(cpu.pc, 0x1234);
    assert_eq!(cpu.sp, 0x2400);
    assert_eq!(bus.memory[0x23FF], 0x00);
}

#[test]
fn test_interrupt_pushes_pc_and_vectors() {
    let mut cpu = I8080::new();
    let mut bus = TestBus::new();
    cpu.pc = 0x1234;
    cpu.sp = 0x2400;
    cpu.inte = true;

    assert!(cpu.interrupt(&mut bus, MASTER, 0x0010));
    assert_eq!(cpu.pc, 0x0010);
    assert_eq!(cpu.sp, 0x23FE);
    assert_eq!(bus.memory[0x23FF], 0x12);
    assert_eq!(bus.memory[0x23FE], 0x34);
    assert!(!cpu.inte, "acknowledge disables further interrupts");
}

#[test]
fn test_interrupt_cost_charged_to_next_burst() {
    let mut cpu = I8080::new();
    let mut bus = TestBus::new();
    cpu.sp = 0x2400;
    cpu.inte = true;

    cpu.interrupt(&mut bus, MASTER, 0x0008);
    assert_eq!(cpu.snapshot().pending_cycles, INTERRUPT_CYCLES);

    // Budget smaller than the pending cost: nothing executes.
    let consumed = cpu.execute(&mut bus, MASTER, 1);
    assert_eq!(consumed, INTERRUPT_CYCLES);
    assert_eq!(cpu.pc, 0x0008);

    // Pending cost is consumed only once.
    let consumed = cpu.execute(&mut bus, MASTER, 4);
    assert_eq!(consumed, 4);
    assert_eq!(cpu.pc, 0x0009);
}

#[test]
fn test_execute_budget_near_u32_max_saturates() {
    let mut cpu = I8080::new();
    let mut bus = TestBus::new();
    cpu.restore(&I8080State {
        pending_cycles: u32::MAX - 2,
        ..Default::default()
    });

    // Memory is all NOPs; the count stops at the cap instead of wrapping.
    assert_eq!(cpu.execute(&mut bus, MASTER, u32::MAX), u32::MAX);
    assert_eq!(cpu.pc, 1);
}

#[test]
fn test_interrupt_wakes_halted_cpu() {
    let mut cpu = I8080::new();
    let mut bus = TestBus::new();
    bus.load(0, &[0xFB, 0x76]); // EI; HLT
    bus.load(0x0008, &[0x3C, 0x76]); // INR A; HLT
    cpu.sp = 0x2400;

    cpu.execute(&mut bus, MASTER, 100);
    assert!(cpu.halted);
    assert_eq!(cpu.pc, 2);

    assert!(cpu.interrupt(&mut bus, MASTER, 0x0008));
    assert!(!cpu.halted);
    // Return address is the instruction after HLT.
    assert_eq!(bus.memory[0x23FE], 0x02);

    let consumed = cpu.execute(&mut bus, MASTER, 100);
    assert_eq!(consumed, INTERRUPT_CYCLES + 5 + 7);
    assert_eq!(cpu.a, 1);
    assert!(cpu.halted);
}

#[test]
fn test_halted_burst_drops_pending_cost() {
    let mut cpu = I8080::new();
    let mut bus = TestBus::new();
    cpu.halted = true;
    cpu.restore(&I8080State {
        halted: true,
        pending_cycles: 11,
        f: 0x02,
        ..Default::default()
    });

    assert_eq!(cpu.execute(&mut bus, MASTER, 100), 100);
    assert_eq!(cpu.snapshot().pending_cycles, 0);
}

// ============================================================
// Reset and snapshots
// ============================================================

#[test]
fn test_reset_clears_state() {
    let mut cpu = I8080::new();
    cpu.a = 0x12;
    cpu.sp = 0x2400;
    cpu.inte = true;
    cpu.halted = true;
    cpu.f = 0xFF;

    cpu.reset(0x0001);
    assert_eq!(cpu.pc, 0x0001);
    assert_eq!(cpu.a, 0);
    assert_eq!(cpu.sp, 0);
    assert_eq!(cpu.f, 0x02);
    assert!(!cpu.inte);
    assert!(!cpu.halted);
}

#[test]
fn test_snapshot_restore_round_trip() {
    let mut cpu = I8080::new();
    cpu.a = 0x11;
    cpu.set_bc(0x2233);
    cpu.set_de(0x4455);
    cpu.set_hl(0x6677);
    cpu.f = 0x57;
    cpu.sp = 0x23F0;
    cpu.pc = 0x1ABC;
    cpu.inte = true;

    let snap = cpu.snapshot();
    let mut other = I8080::new();
    other.restore(&snap);
    assert_eq!(other.snapshot(), snap);
    assert_eq!(other.get_hl(), 0x6677);
}

#[test]
fn test_restore_masks_flag_byte() {
    let mut cpu = I8080::new();
    cpu.restore(&I8080State {
        f: 0xFF,
        ..Default::default()
    });
    assert_eq!(cpu.f, 0xD7);
}
