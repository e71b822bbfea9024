//! mbarrier lifecycle: init, expect, arrive, wait, invalidate.
//!
//! Every instruction here takes the barrier as `alloc`, a `[1] x i64`
//! shared-memory descriptor.

use std::rc::Rc;

use crate::value::Value;

/// Initialize the barrier to expect `count` arrivals per phase.
#[derive(Debug, Clone, PartialEq)]
pub struct InitBarrier {
    pub alloc: Rc<Value>,
    pub count: u32,
}

/// Invalidate the barrier so its memory can be reused.
#[derive(Debug, Clone, PartialEq)]
pub struct InvalBarrier {
    pub alloc: Rc<Value>,
}

/// Arm the barrier to expect `size` bytes of async transactions.
#[derive(Debug, Clone, PartialEq)]
pub struct BarrierExpect {
    pub alloc: Rc<Value>,
    pub size: u32,
    pub pred: Rc<Value>,
}

/// Block until the barrier completes the phase given by `phase`.
#[derive(Debug, Clone, PartialEq)]
pub struct WaitBarrier {
    pub alloc: Rc<Value>,
    pub phase: Rc<Value>,
    pub pred: Option<Rc<Value>>,
    /// Buffers whose async writes this wait completes.
    pub deps: Vec<Rc<Value>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArriveBarrier {
    pub alloc: Rc<Value>,
    pub count: i32,
    pub pred: Option<Rc<Value>>,
}
