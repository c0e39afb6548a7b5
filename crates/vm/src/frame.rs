use ocl_core::Value;

/// One active function call. `stack_base` is the index into the VM's value
/// stack where this call's arguments begin; everything above it that is
/// left over when the call returns is discarded.
pub struct CallFrame {
    pub return_ip: u32,
    pub stack_base: usize,
    pub locals: Vec<Value>,
}
