/// Recommended error type for the driver `main` function and anything that wires the runner
/// together. Domain errors convert into it so you can use `?` to propagate them.
pub type DriverResult<T> = anyhow::Result<T>;
