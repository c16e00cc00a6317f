//! Baby Jubjub, the twisted Edwards curve `a·x² + y² = 1 + d·x²·y²` defined
//! over the BN254 scalar field.

use std::sync::OnceLock;
use ark_ff::{MontFp, Zero};
use num_bigint::BigUint;
use crate::types::Fr;

pub const A: Fr = MontFp!("168700");
pub const D: Fr = MontFp!("168696");

/// Big-endian bytes of the prime order of the subgroup generated by `BASE8`.
const SUB_ORDER_BE: [u8; 32] = [
    0x06, 0x0c, 0x89, 0xce, 0x5c, 0x26, 0x34, 0x05, 0x37, 0x0a, 0x08, 0xb6, 0xd0, 0x30, 0x2b, 0x0b,
    0xab, 0x3e, 0xed, 0xb8, 0x39, 0x20, 0xee, 0x0a, 0x67, 0x72, 0x97, 0xdc, 0x39, 0x21, 0x26, 0xf1,
];

pub fn sub_order() -> &'static BigUint
{
    static SUB_ORDER: OnceLock<BigUint> = OnceLock::new();
    SUB_ORDER.get_or_init(|| BigUint::from_bytes_be(&SUB_ORDER_BE))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Point
{
    pub x: Fr,
    pub y: Fr,
}

impl Point
{
    /// The neutral element, which also encodes the bit 0 under ElGamal.
    pub const IDENTITY: Point = Point { x: MontFp!("0"), y: MontFp!("1") };

    /// Generator of the prime order subgroup.
    pub const BASE8: Point = Point {
        x: MontFp!("5299619240641551281634865583518297030282874472190772894086521144482721001553"),
        y: MontFp!("16950150798460657717958625567821834550301663161624707787222815936182638968203"),
    };

    pub fn new(x: Fr, y: Fr) -> Self
    {
        Point { x, y }
    }

    pub fn as_array(&self) -> [Fr; 2]
    {
        [self.x, self.y]
    }

    pub fn in_curve(&self) -> bool
    {
        let x2 = self.x * self.x;
        let y2 = self.y * self.y;
        A * x2 + y2 == Fr::from(1u64) + D * x2 * y2
    }

    /// Twisted Edwards addition. Both operands must lie on the curve, for
    /// which the denominators never vanish.
    pub fn add(&self, other: &Point) -> Point
    {
        let one = Fr::from(1u64);
        let x1x2 = self.x * other.x;
        let y1y2 = self.y * other.y;
        let dxy = D * x1x2 * y1y2;

        let x = (self.x * other.y + self.y * other.x) / (one + dxy);
        let y = (y1y2 - A * x1x2) / (one - dxy);

        Point { x, y }
    }

    pub fn negate(&self) -> Point
    {
        Point { x: -self.x, y: self.y }
    }

    /// Double-and-add, least significant bit first.
    pub fn mul_scalar(&self, scalar: &BigUint) -> Point
    {
        let mut result = Point::IDENTITY;
        let mut addend = *self;

        for bit in 0..scalar.bits()
        {
            if scalar.bit(bit) { result = result.add(&addend); }
            addend = addend.add(&addend);
        }

        result
    }

    pub fn is_identity(&self) -> bool
    {
        self.x.is_zero() && self.y == Fr::from(1u64)
    }
}
