use std::sync::Arc;

/// Pure activation function applied to a neuron's biased weighted sum.
pub type ActivationFn = Arc<dyn Fn(f32) -> f32 + Send + Sync>;

/// Numerically stable logistic sigmoid. The two-branch form avoids
/// overflowing `exp` for large-magnitude negative inputs.
pub fn sigmoid(x: f32) -> f32 {
    if x >= 0.0 {
        let z = (-x).exp();
        1.0 / (1.0 + z)
    } else {
        let z = x.exp();
        z / (1.0 + z)
    }
}

/// The default activation used by neurons whose record names no function.
pub fn default_activation() -> ActivationFn {
    Arc::new(sigmoid)
}
