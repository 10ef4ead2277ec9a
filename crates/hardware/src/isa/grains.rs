//! Builtin grain set.
//!
//! Builders producing `(DecodedInst, Grain)` pairs with the execute
//! semantics of the instructions the run loop and test suite speak. Each
//! execute function follows the grain contract: results into
//! `slot.payload`, addresses into `slot.va`/`slot.pa`, branch outcomes
//! into the branch fields, faults into the fault fields. Stores never
//! touch memory here; the writeback stage owns the commit.

use crate::common::data::{sext16, sext21};
use crate::common::error::{ArithTrap, TrapClass};
use crate::core::cpu::Cpu;
use crate::core::pipeline::grain::{
    BarrierKind, ControlSignals, DecodedInst, ExecUnit, FetchResult, Grain, GrainFn, MemWidth,
    SerializeClass,
};
use crate::core::pipeline::slot::Slot;
use crate::isa::opcodes;

/// A decoded instruction with its grain, ready to fetch.
pub type DecodedGrain = (DecodedInst, Grain);

/// Wraps a decoded grain as the fetch record for `pc`.
pub fn fetch(pc: u64, dg: DecodedGrain) -> FetchResult {
    FetchResult {
        pc,
        di: dg.0,
        grain: Some(dg.1),
        predicted_valid: false,
        predicted_taken: false,
        predicted_target: 0,
        valid: true,
    }
}

fn grain(unit: ExecUnit, exec: GrainFn) -> Grain {
    Grain { unit, exec }
}

fn rb_or_literal(slot: &Slot, cpu: &Cpu) -> u64 {
    if slot.di.uses_literal {
        u64::from(slot.di.literal)
    } else {
        cpu.view.read_int(usize::from(slot.di.rb))
    }
}

fn mem_va(slot: &Slot, cpu: &Cpu) -> u64 {
    cpu.view
        .read_int(usize::from(slot.di.rb))
        .wrapping_add(sext16(slot.di.disp16))
}

/// Computes VA/PA for a data access, checking natural alignment.
fn resolve_data(slot: &mut Slot, cpu: &mut Cpu) -> Option<u64> {
    let va = mem_va(slot, cpu);
    slot.va = va;
    let width = slot.di.ctrl.width.bytes();
    if let Err(trap) = cpu.check_align(va, width) {
        slot.fault = Some(trap);
        slot.fault_va = va;
        cpu.view.hwpcb.set_fault_va(va);
        return None;
    }
    let pa = cpu.translate_data(va);
    slot.pa = pa;
    Some(pa)
}

// ── Execute functions ──────────────────────────────────────────────

fn exec_nop(_slot: &mut Slot, _cpu: &mut Cpu) {}

fn exec_lda(slot: &mut Slot, cpu: &mut Cpu) {
    let base = cpu.view.read_int(usize::from(slot.di.rb));
    let result = base.wrapping_add(sext16(slot.di.disp16));
    slot.payload = result;
}

fn exec_ldah(slot: &mut Slot, cpu: &mut Cpu) {
    let base = cpu.view.read_int(usize::from(slot.di.rb));
    let result = base.wrapping_add(sext16(slot.di.disp16) << 16);
    slot.payload = result;
}

fn exec_addq(slot: &mut Slot, cpu: &mut Cpu) {
    let a = cpu.view.read_int(usize::from(slot.di.ra));
    let result = a.wrapping_add(rb_or_literal(slot, cpu));
    slot.payload = result;
}

fn exec_addq_v(slot: &mut Slot, cpu: &mut Cpu) {
    let a = cpu.view.read_int(usize::from(slot.di.ra)) as i64;
    let b = rb_or_literal(slot, cpu) as i64;
    let (sum, overflow) = a.overflowing_add(b);
    slot.payload = sum as u64;
    if overflow {
        cpu.view.pal.or_arith(ArithTrap::Iov);
        slot.fault = Some(TrapClass::Arith(ArithTrap::Iov));
        slot.fault_va = slot.pc & !1;
    }
}

fn exec_subq(slot: &mut Slot, cpu: &mut Cpu) {
    let a = cpu.view.read_int(usize::from(slot.di.ra));
    let result = a.wrapping_sub(rb_or_literal(slot, cpu));
    slot.payload = result;
}

fn exec_and(slot: &mut Slot, cpu: &mut Cpu) {
    let a = cpu.view.read_int(usize::from(slot.di.ra));
    let result = a & rb_or_literal(slot, cpu);
    slot.payload = result;
}

fn exec_bis(slot: &mut Slot, cpu: &mut Cpu) {
    let a = cpu.view.read_int(usize::from(slot.di.ra));
    let result = a | rb_or_literal(slot, cpu);
    slot.payload = result;
}

fn exec_xor(slot: &mut Slot, cpu: &mut Cpu) {
    let a = cpu.view.read_int(usize::from(slot.di.ra));
    let result = a ^ rb_or_literal(slot, cpu);
    slot.payload = result;
}

fn exec_sll(slot: &mut Slot, cpu: &mut Cpu) {
    let a = cpu.view.read_int(usize::from(slot.di.ra));
    let result = a << (rb_or_literal(slot, cpu) & 63);
    slot.payload = result;
}

fn exec_srl(slot: &mut Slot, cpu: &mut Cpu) {
    let a = cpu.view.read_int(usize::from(slot.di.ra));
    let result = a >> (rb_or_literal(slot, cpu) & 63);
    slot.payload = result;
}

fn exec_cmpeq(slot: &mut Slot, cpu: &mut Cpu) {
    let a = cpu.view.read_int(usize::from(slot.di.ra));
    let result = u64::from(a == rb_or_literal(slot, cpu));
    slot.payload = result;
}

fn exec_cmplt(slot: &mut Slot, cpu: &mut Cpu) {
    let a = cpu.view.read_int(usize::from(slot.di.ra)) as i64;
    let result = u64::from(a < rb_or_literal(slot, cpu) as i64);
    slot.payload = result;
}

fn exec_load(slot: &mut Slot, cpu: &mut Cpu) {
    let Some(pa) = resolve_data(slot, cpu) else {
        return;
    };
    let width = slot.di.ctrl.width.bytes();
    match cpu.load_pa(pa, width) {
        Ok(raw) => {
            slot.payload = if slot.di.opcode == opcodes::LDL || slot.di.opcode == opcodes::LDL_L {
                raw as u32 as i32 as i64 as u64
            } else {
                raw
            };
            if slot.di.ctrl.load_locked {
                cpu.reservations.set_reservation(cpu.id, pa);
            }
        }
        Err(trap) => {
            slot.fault = Some(trap);
            slot.fault_va = slot.va;
            cpu.view.hwpcb.set_fault_va(slot.va);
        }
    }
}

fn exec_load_fp(slot: &mut Slot, cpu: &mut Cpu) {
    if !cpu.view.hwpcb.fen {
        slot.fault = Some(TrapClass::FpDisabled);
        slot.fault_va = slot.pc & !1;
        return;
    }
    let Some(pa) = resolve_data(slot, cpu) else {
        return;
    };
    let width = slot.di.ctrl.width.bytes();
    match cpu.load_pa(pa, width) {
        Ok(raw) => {
            slot.payload = if slot.di.opcode == opcodes::LDS {
                crate::common::data::s_to_t(raw as u32)
            } else {
                raw
            };
        }
        Err(trap) => {
            slot.fault = Some(trap);
            slot.fault_va = slot.va;
            cpu.view.hwpcb.set_fault_va(slot.va);
        }
    }
}

fn exec_store(slot: &mut Slot, cpu: &mut Cpu) {
    if resolve_data(slot, cpu).is_none() {
        return;
    }
    slot.payload = cpu.view.read_int(usize::from(slot.di.ra));
}

fn exec_store_fp(slot: &mut Slot, cpu: &mut Cpu) {
    if !cpu.view.hwpcb.fen {
        slot.fault = Some(TrapClass::FpDisabled);
        slot.fault_va = slot.pc & !1;
        return;
    }
    if resolve_data(slot, cpu).is_none() {
        return;
    }
    slot.payload = cpu.view.read_fp(usize::from(slot.di.ra));
}

fn exec_br(slot: &mut Slot, _cpu: &mut Cpu) {
    slot.branch_taken = true;
    slot.branch_target = slot
        .pc
        .wrapping_add(4)
        .wrapping_add(sext21(slot.di.disp21) << 2);
}

fn exec_jmp(slot: &mut Slot, cpu: &mut Cpu) {
    slot.branch_taken = true;
    slot.branch_target = cpu.view.read_int(usize::from(slot.di.rb)) & !3;
}

fn exec_cond_branch(slot: &mut Slot, cpu: &mut Cpu) {
    let a = cpu.view.read_int(usize::from(slot.di.ra));
    let taken = match slot.di.opcode {
        opcodes::BEQ => a == 0,
        opcodes::BNE => a != 0,
        opcodes::BLT => (a as i64) < 0,
        opcodes::BLE => (a as i64) <= 0,
        opcodes::BGE => (a as i64) >= 0,
        opcodes::BGT => (a as i64) > 0,
        opcodes::BLBC => a & 1 == 0,
        opcodes::BLBS => a & 1 != 0,
        _ => false,
    };
    slot.branch_taken = taken;
    slot.branch_target = if taken {
        slot.pc
            .wrapping_add(4)
            .wrapping_add(sext21(slot.di.disp21) << 2)
    } else {
        slot.pc.wrapping_add(4)
    };
}

fn exec_call_pal(slot: &mut Slot, _cpu: &mut Cpu) {
    // Disposition is decided at writeback; the transfer flag keeps the
    // slot identifiable across the backend.
    slot.pal_transfer = true;
}

// ── Builders ───────────────────────────────────────────────────────

fn mem_di(opcode: u8, ra: u8, rb: u8, disp16: u32, ctrl: ControlSignals) -> DecodedInst {
    DecodedInst {
        opcode,
        ra,
        rb,
        disp16: disp16 & 0xFFFF,
        unit: ExecUnit::MBox,
        ctrl,
        ..DecodedInst::default()
    }
}

fn operate_di(opcode: u8, ra: u8, rb: u8, rc: u8, function: u32) -> DecodedInst {
    DecodedInst {
        opcode,
        ra,
        rb,
        rc,
        function,
        unit: ExecUnit::EBox,
        ctrl: ControlSignals {
            int_write: true,
            ..ControlSignals::default()
        },
        ..DecodedInst::default()
    }
}

/// `LDA Ra, disp(Rb)`.
pub fn lda(ra: u8, rb: u8, disp: i16) -> DecodedGrain {
    let mut di = operate_di(opcodes::LDA, ra, rb, 0, 0);
    di.disp16 = disp as u16 as u32;
    di.rc = ra;
    di.ctrl.int_write = true;
    (di, grain(ExecUnit::EBox, exec_lda))
}

/// `LDAH Ra, disp(Rb)`.
pub fn ldah(ra: u8, rb: u8, disp: i16) -> DecodedGrain {
    let mut di = operate_di(opcodes::LDAH, ra, rb, 0, 0);
    di.disp16 = disp as u16 as u32;
    di.rc = ra;
    (di, grain(ExecUnit::EBox, exec_ldah))
}

/// `ADDQ Ra, Rb, Rc`.
pub fn addq(ra: u8, rb: u8, rc: u8) -> DecodedGrain {
    (
        operate_di(opcodes::INTA, ra, rb, rc, 0x20),
        grain(ExecUnit::EBox, exec_addq),
    )
}

/// `ADDQ Ra, #lit, Rc`.
pub fn addq_lit(ra: u8, literal: u8, rc: u8) -> DecodedGrain {
    let mut di = operate_di(opcodes::INTA, ra, 31, rc, 0x20);
    di.literal = literal;
    di.uses_literal = true;
    (di, grain(ExecUnit::EBox, exec_addq))
}

/// `ADDQ/V Ra, Rb, Rc` (integer overflow trap enabled).
pub fn addq_v(ra: u8, rb: u8, rc: u8) -> DecodedGrain {
    (
        operate_di(opcodes::INTA, ra, rb, rc, 0x60),
        grain(ExecUnit::EBox, exec_addq_v),
    )
}

/// `SUBQ Ra, Rb, Rc`.
pub fn subq(ra: u8, rb: u8, rc: u8) -> DecodedGrain {
    (
        operate_di(opcodes::INTA, ra, rb, rc, 0x29),
        grain(ExecUnit::EBox, exec_subq),
    )
}

/// `SUBQ Ra, #lit, Rc`.
pub fn subq_lit(ra: u8, literal: u8, rc: u8) -> DecodedGrain {
    let mut di = operate_di(opcodes::INTA, ra, 31, rc, 0x29);
    di.literal = literal;
    di.uses_literal = true;
    (di, grain(ExecUnit::EBox, exec_subq))
}

/// `AND Ra, Rb, Rc`.
pub fn and(ra: u8, rb: u8, rc: u8) -> DecodedGrain {
    (
        operate_di(opcodes::INTL, ra, rb, rc, 0x00),
        grain(ExecUnit::EBox, exec_and),
    )
}

/// `BIS Ra, Rb, Rc` (logical OR; `BIS R31, R31, Rc` is the canonical clear).
pub fn bis(ra: u8, rb: u8, rc: u8) -> DecodedGrain {
    (
        operate_di(opcodes::INTL, ra, rb, rc, 0x20),
        grain(ExecUnit::EBox, exec_bis),
    )
}

/// `XOR Ra, Rb, Rc`.
pub fn xor(ra: u8, rb: u8, rc: u8) -> DecodedGrain {
    (
        operate_di(opcodes::INTL, ra, rb, rc, 0x40),
        grain(ExecUnit::EBox, exec_xor),
    )
}

/// `SLL Ra, #lit, Rc`.
pub fn sll_lit(ra: u8, literal: u8, rc: u8) -> DecodedGrain {
    let mut di = operate_di(opcodes::INTS, ra, 31, rc, 0x39);
    di.literal = literal;
    di.uses_literal = true;
    (di, grain(ExecUnit::EBox, exec_sll))
}

/// `SRL Ra, #lit, Rc`.
pub fn srl_lit(ra: u8, literal: u8, rc: u8) -> DecodedGrain {
    let mut di = operate_di(opcodes::INTS, ra, 31, rc, 0x34);
    di.literal = literal;
    di.uses_literal = true;
    (di, grain(ExecUnit::EBox, exec_srl))
}

/// `CMPEQ Ra, Rb, Rc`.
pub fn cmpeq(ra: u8, rb: u8, rc: u8) -> DecodedGrain {
    (
        operate_di(opcodes::INTA, ra, rb, rc, 0x2D),
        grain(ExecUnit::EBox, exec_cmpeq),
    )
}

/// `CMPLT Ra, Rb, Rc`.
pub fn cmplt(ra: u8, rb: u8, rc: u8) -> DecodedGrain {
    (
        operate_di(opcodes::INTA, ra, rb, rc, 0x4D),
        grain(ExecUnit::EBox, exec_cmplt),
    )
}

fn load_ctrl(width: MemWidth, locked: bool) -> ControlSignals {
    ControlSignals {
        mem_read: true,
        load_locked: locked,
        width,
        ..ControlSignals::default()
    }
}

fn store_ctrl(width: MemWidth, cond: bool) -> ControlSignals {
    ControlSignals {
        mem_write: true,
        store_cond: cond,
        width,
        ..ControlSignals::default()
    }
}

/// `LDQ Ra, disp(Rb)`.
pub fn ldq(ra: u8, rb: u8, disp: i16) -> DecodedGrain {
    (
        mem_di(opcodes::LDQ, ra, rb, disp as u16 as u32, load_ctrl(MemWidth::Quad, false)),
        grain(ExecUnit::MBox, exec_load),
    )
}

/// `LDL Ra, disp(Rb)` (sign-extends the longword).
pub fn ldl(ra: u8, rb: u8, disp: i16) -> DecodedGrain {
    (
        mem_di(opcodes::LDL, ra, rb, disp as u16 as u32, load_ctrl(MemWidth::Long, false)),
        grain(ExecUnit::MBox, exec_load),
    )
}

/// `LDBU Ra, disp(Rb)`.
pub fn ldbu(ra: u8, rb: u8, disp: i16) -> DecodedGrain {
    (
        mem_di(opcodes::LDBU, ra, rb, disp as u16 as u32, load_ctrl(MemWidth::Byte, false)),
        grain(ExecUnit::MBox, exec_load),
    )
}

/// `LDQ_L Ra, disp(Rb)`.
pub fn ldq_l(ra: u8, rb: u8, disp: i16) -> DecodedGrain {
    (
        mem_di(opcodes::LDQ_L, ra, rb, disp as u16 as u32, load_ctrl(MemWidth::Quad, true)),
        grain(ExecUnit::MBox, exec_load),
    )
}

/// `LDT Fa, disp(Rb)`.
pub fn ldt(fa: u8, rb: u8, disp: i16) -> DecodedGrain {
    let mut ctrl = load_ctrl(MemWidth::Quad, false);
    ctrl.fp_write = true;
    (
        mem_di(opcodes::LDT, fa, rb, disp as u16 as u32, ctrl),
        grain(ExecUnit::MBox, exec_load_fp),
    )
}

/// `LDS Fa, disp(Rb)` (expands S_floating into the T register format).
pub fn lds(fa: u8, rb: u8, disp: i16) -> DecodedGrain {
    let mut ctrl = load_ctrl(MemWidth::Long, false);
    ctrl.fp_write = true;
    (
        mem_di(opcodes::LDS, fa, rb, disp as u16 as u32, ctrl),
        grain(ExecUnit::MBox, exec_load_fp),
    )
}

/// `STQ Ra, disp(Rb)`.
pub fn stq(ra: u8, rb: u8, disp: i16) -> DecodedGrain {
    (
        mem_di(opcodes::STQ, ra, rb, disp as u16 as u32, store_ctrl(MemWidth::Quad, false)),
        grain(ExecUnit::MBox, exec_store),
    )
}

/// `STL Ra, disp(Rb)`.
pub fn stl(ra: u8, rb: u8, disp: i16) -> DecodedGrain {
    (
        mem_di(opcodes::STL, ra, rb, disp as u16 as u32, store_ctrl(MemWidth::Long, false)),
        grain(ExecUnit::MBox, exec_store),
    )
}

/// `STQ_C Ra, disp(Rb)`.
pub fn stq_c(ra: u8, rb: u8, disp: i16) -> DecodedGrain {
    (
        mem_di(opcodes::STQ_C, ra, rb, disp as u16 as u32, store_ctrl(MemWidth::Quad, true)),
        grain(ExecUnit::MBox, exec_store),
    )
}

/// `STT Fa, disp(Rb)`.
pub fn stt(fa: u8, rb: u8, disp: i16) -> DecodedGrain {
    (
        mem_di(opcodes::STT, fa, rb, disp as u16 as u32, store_ctrl(MemWidth::Quad, false)),
        grain(ExecUnit::MBox, exec_store_fp),
    )
}

/// `BR Ra, disp` (unconditional; the usual `BR R31` discards the link).
pub fn br(ra: u8, disp21: i32) -> DecodedGrain {
    let di = DecodedInst {
        opcode: opcodes::BR,
        ra,
        disp21: (disp21 as u32) & 0x1F_FFFF,
        unit: ExecUnit::EBox,
        ctrl: ControlSignals {
            uncond_branch: true,
            links: true,
            ..ControlSignals::default()
        },
        ..DecodedInst::default()
    };
    (di, grain(ExecUnit::EBox, exec_br))
}

/// `BSR Ra, disp`.
pub fn bsr(ra: u8, disp21: i32) -> DecodedGrain {
    let di = DecodedInst {
        opcode: opcodes::BSR,
        ra,
        disp21: (disp21 as u32) & 0x1F_FFFF,
        unit: ExecUnit::EBox,
        ctrl: ControlSignals {
            uncond_branch: true,
            links: true,
            ..ControlSignals::default()
        },
        ..DecodedInst::default()
    };
    (di, grain(ExecUnit::EBox, exec_br))
}

/// `JMP Ra, (Rb)` (`JMP R31` discards the link).
pub fn jmp(ra: u8, rb: u8) -> DecodedGrain {
    let di = DecodedInst {
        opcode: opcodes::JSR_GRP,
        ra,
        rb,
        unit: ExecUnit::EBox,
        ctrl: ControlSignals {
            jump: true,
            links: true,
            ..ControlSignals::default()
        },
        ..DecodedInst::default()
    };
    (di, grain(ExecUnit::EBox, exec_jmp))
}

/// Conditional branch of the given opcode (`BEQ`..`BLBS`).
pub fn cond_branch(opcode: u8, ra: u8, disp21: i32) -> DecodedGrain {
    let di = DecodedInst {
        opcode,
        ra,
        disp21: (disp21 as u32) & 0x1F_FFFF,
        unit: ExecUnit::EBox,
        ctrl: ControlSignals {
            cond_branch: true,
            ..ControlSignals::default()
        },
        ..DecodedInst::default()
    };
    (di, grain(ExecUnit::EBox, exec_cond_branch))
}

/// `CALL_PAL func`.
pub fn call_pal(function: u32) -> DecodedGrain {
    let di = DecodedInst {
        opcode: opcodes::CALL_PAL,
        function,
        unit: ExecUnit::PalBox,
        ctrl: ControlSignals {
            call_pal: true,
            serialize: SerializeClass::Full,
            ..ControlSignals::default()
        },
        ..DecodedInst::default()
    };
    (di, grain(ExecUnit::PalBox, exec_call_pal))
}

/// `MB` memory barrier.
pub fn mb() -> DecodedGrain {
    let di = DecodedInst {
        opcode: opcodes::MISC,
        function: opcodes::FUNC_MB,
        unit: ExecUnit::MBox,
        ctrl: ControlSignals {
            barrier: Some(BarrierKind::Mb),
            ..ControlSignals::default()
        },
        ..DecodedInst::default()
    };
    (di, grain(ExecUnit::MBox, exec_nop))
}

/// `WMB` write memory barrier.
pub fn wmb() -> DecodedGrain {
    let di = DecodedInst {
        opcode: opcodes::MISC,
        function: opcodes::FUNC_WMB,
        unit: ExecUnit::MBox,
        ctrl: ControlSignals {
            barrier: Some(BarrierKind::Wmb),
            ..ControlSignals::default()
        },
        ..DecodedInst::default()
    };
    (di, grain(ExecUnit::MBox, exec_nop))
}

/// Architectural no-op (`BIS R31, R31, R31`).
pub fn nop() -> DecodedGrain {
    bis(31, 31, 31)
}
