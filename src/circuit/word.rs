use crate::circuit::factory::BitFactory;
use std::ops::Range;

//
// Public Interface
//

/// Fixed-width bit vector, least significant bit first. All arithmetic
/// is bit-sliced over the active factory's gates; there is no native
/// integer anywhere below this type.
#[derive(Clone, Debug)]
pub struct Word<B>(Vec<B>);

/// Flag bits derived from a subtraction.
#[derive(Clone, Debug)]
pub struct Comparison<B> {
    pub less: B,
    pub equal: B,
}

impl<B: Clone> Word<B> {
    pub fn from_bits(bits: Vec<B>) -> Self {
        assert!(!bits.is_empty(), "word must have at least one bit");
        Word(bits)
    }

    pub fn from_constant<F>(f: &mut F, width: usize, value: u64) -> Self
    where
        F: BitFactory<Bit = B>,
    {
        assert!(width >= 1 && width <= 64);
        assert!(
            width == 64 || value >> width == 0,
            "value {} outside [0, 2^{})",
            value,
            width
        );
        let bits = (0..width).map(|i| f.constant(value >> i & 1 == 1)).collect();
        Word(bits)
    }

    pub fn width(&self) -> usize {
        self.0.len()
    }

    pub fn bit(&self, index: usize) -> &B {
        &self.0[index]
    }

    pub fn bits(&self) -> &[B] {
        &self.0
    }

    pub fn msb(&self) -> &B {
        self.0.last().expect("word is never empty")
    }

    pub fn slice(&self, range: Range<usize>) -> Word<B> {
        Word::from_bits(self.0[range].to_vec())
    }

    pub fn zero_extend<F>(&self, f: &mut F, width: usize) -> Word<B>
    where
        F: BitFactory<Bit = B>,
    {
        assert!(width >= self.width());
        let mut bits = self.0.clone();
        while bits.len() < width {
            bits.push(f.constant(false));
        }
        Word(bits)
    }

    pub fn invert<F>(&self, f: &mut F) -> Word<B>
    where
        F: BitFactory<Bit = B>,
    {
        Word(self.0.iter().map(|b| f.not(b)).collect())
    }

    /// Ripple-carry addition: a half adder for bit 0, full adders above.
    /// Returns the sum and the final carry.
    pub fn add<F>(&self, f: &mut F, other: &Word<B>) -> (Word<B>, B)
    where
        F: BitFactory<Bit = B>,
    {
        assert_eq!(self.width(), other.width(), "word widths must match");
        let (sum0, mut carry) = half_adder(f, &self.0[0], &other.0[0]);
        let mut bits = vec![sum0];
        for i in 1..self.width() {
            let (sum, next) = full_adder(f, &self.0[i], &other.0[i], &carry);
            bits.push(sum);
            carry = next;
        }
        (Word(bits), carry)
    }

    /// Two's-complement subtraction: add the inverted subtrahend with a
    /// carry-in of true. The returned carry is set when no borrow
    /// occurred, i.e. when `self >= other`.
    pub fn sub<F>(&self, f: &mut F, other: &Word<B>) -> (Word<B>, B)
    where
        F: BitFactory<Bit = B>,
    {
        assert_eq!(self.width(), other.width(), "word widths must match");
        let inverted = other.invert(f);
        let mut carry = f.constant(true);
        let mut bits = Vec::with_capacity(self.width());
        for i in 0..self.width() {
            let (sum, next) = full_adder(f, &self.0[i], &inverted.0[i], &carry);
            bits.push(sum);
            carry = next;
        }
        (Word(bits), carry)
    }

    /// Less-than is the sign bit of the difference, equality a zero
    /// detection over it.
    pub fn compare<F>(&self, f: &mut F, other: &Word<B>) -> Comparison<B>
    where
        F: BitFactory<Bit = B>,
    {
        let (diff, _) = self.sub(f, other);
        let equal = diff.is_zero(f);
        Comparison {
            less: diff.msb().clone(),
            equal,
        }
    }

    /// Bitwise mux; the only conditional mechanism in the machine.
    pub fn select<F>(f: &mut F, ctrl: &B, a: &Word<B>, b: &Word<B>) -> Word<B>
    where
        F: BitFactory<Bit = B>,
    {
        assert_eq!(a.width(), b.width(), "word widths must match");
        let bits = a
            .0
            .iter()
            .zip(b.0.iter())
            .map(|(x, y)| f.mux(ctrl, x, y))
            .collect();
        Word(bits)
    }

    /// AND-reduction of the inverted bits.
    pub fn is_zero<F>(&self, f: &mut F) -> B
    where
        F: BitFactory<Bit = B>,
    {
        let mut acc = f.not(&self.0[0]);
        for bit in &self.0[1..] {
            let inverted = f.not(bit);
            acc = f.and(&acc, &inverted);
        }
        acc
    }

    /// Equality against a known constant: AND-reduce each bit or its
    /// inversion, depending on the constant's bit pattern.
    pub fn equals_constant<F>(&self, f: &mut F, value: u64) -> B
    where
        F: BitFactory<Bit = B>,
    {
        assert!(
            self.width() == 64 || value >> self.width() == 0,
            "value {} outside [0, 2^{})",
            value,
            self.width()
        );
        let mut acc: Option<B> = None;
        for (i, bit) in self.0.iter().enumerate() {
            let matched = if value >> i & 1 == 1 {
                bit.clone()
            } else {
                f.not(bit)
            };
            acc = Some(match acc {
                Some(prev) => f.and(&prev, &matched),
                None => matched,
            });
        }
        acc.expect("word is never empty")
    }

    /// Rotation is pure reindexing and costs no gates.
    pub fn rotate_left(&self) -> Word<B> {
        let w = self.width();
        let mut bits = Vec::with_capacity(w);
        bits.push(self.0[w - 1].clone());
        bits.extend_from_slice(&self.0[..w - 1]);
        Word(bits)
    }

    /// Shift towards the most significant bit; only the entering and
    /// leaving bits change, no gates involved.
    pub fn shift_left(&self, carry_in: B) -> (Word<B>, B) {
        let w = self.width();
        let carry_out = self.0[w - 1].clone();
        let mut bits = Vec::with_capacity(w);
        bits.push(carry_in);
        bits.extend_from_slice(&self.0[..w - 1]);
        (Word(bits), carry_out)
    }
}

impl<B> Comparison<B> {
    pub fn greater<F>(&self, f: &mut F) -> B
    where
        F: BitFactory<Bit = B>,
        B: Clone,
    {
        let not_less = f.not(&self.less);
        let not_equal = f.not(&self.equal);
        f.and(&not_less, &not_equal)
    }
}

//
// Private Implementation
//

fn half_adder<F: BitFactory>(f: &mut F, a: &F::Bit, b: &F::Bit) -> (F::Bit, F::Bit) {
    let sum = f.xor(a, b);
    let carry = f.and(a, b);
    (sum, carry)
}

// Sum is `a ^ b ^ c`; carry is `(a & b) ^ (c & (a ^ b))`, which equals
// the majority since the two products are disjoint.
fn full_adder<F: BitFactory>(
    f: &mut F,
    a: &F::Bit,
    b: &F::Bit,
    c: &F::Bit,
) -> (F::Bit, F::Bit) {
    let a_xor_b = f.xor(a, b);
    let sum = f.xor(&a_xor_b, c);
    let both = f.and(a, b);
    let propagated = f.and(c, &a_xor_b);
    let carry = f.xor(&both, &propagated);
    (sum, carry)
}
