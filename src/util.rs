/// Elements with a width, measured in register slots
///
/// Most values fit in a single 32-bit register, but `long` and `double` values occupy a pair of
/// consecutive registers (and `void` occupies none).
pub trait Width {
    fn width(&self) -> usize;
}
