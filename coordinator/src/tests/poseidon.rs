use ark_ff::{BigInteger, PrimeField};
use light_poseidon::PoseidonError;
use crate::hash::{hash13, hash_n, sha256_hash, Poseidon, PoseidonHasher, MAX_X5_LEN};
use crate::types::{fr_to_be_bytes, Fr};

/// Check the hash of `1` as a prime field element.
#[test]
fn fr_one()
{
    let mut hasher = Poseidon::new_circom(2).unwrap();

    let expected = [
        0, 122, 243, 70, 226, 211, 4, 39, 158, 121, 224, 169, 243, 2, 63, 119, 18, 148, 167, 138,
        203, 112, 231, 63, 144, 175, 226, 124, 173, 64, 30, 129,
    ];

    let input = Fr::from_be_bytes_mod_order(&[1u8]);
    let hash = hasher.hash(&[input, input]).unwrap();

    assert_eq!(hash.into_bigint().to_bytes_be(), expected);
}

/// Check the hash of one and two.
#[test]
fn fr_one_two()
{
    let mut hasher = Poseidon::new_circom(2).unwrap();
    let hash = hasher.hash(&[Fr::from(1u64), Fr::from(2u64)]).unwrap();

    assert_eq!(
        hash.into_bigint().to_bytes_le(),
        [
            154, 24, 23, 68, 122, 96, 25, 158, 81, 69, 50, 116, 242, 23, 54, 42, 207, 233, 98, 150,
            107, 76, 246, 61, 65, 144, 214, 231, 245, 192, 92, 17
        ]
    );
}

/// Widths 2 through 13 have circom parameters and nothing else does.
#[test]
fn supported_widths()
{
    assert_eq!(Poseidon::with_width(2).unwrap().width(), 2);
    assert_eq!(Poseidon::with_width(MAX_X5_LEN).unwrap().width(), MAX_X5_LEN);
    for width in [0, 1, MAX_X5_LEN + 1, 300]
    {
        assert!(matches!(Poseidon::with_width(width), Err(PoseidonError::InvalidWidthCircom { .. })));
    }
}

/// A hasher rejects inputs of the wrong arity.
#[test]
fn wrong_number_of_inputs()
{
    let mut hasher = Poseidon::new_circom(2).unwrap();
    assert!(matches!(
        hasher.hash(&[Fr::from(1u64)]),
        Err(PoseidonError::InvalidNumberOfInputs { .. })
    ));
    assert!(hash_n(&[]).is_err());
}

// Test cases were created with circomlibjs poseidon([1, ...]) for 1 to 12 inputs
const CIRCOMLIBJS_TEST_CASES: [[u8; 32]; 12] = [
    [
        41, 23, 97, 0, 234, 169, 98, 189, 193, 254, 108, 101, 77, 106, 60, 19, 14, 150, 164, 209,
        22, 139, 51, 132, 139, 137, 125, 197, 2, 130, 1, 51,
    ],
    [
        0, 122, 243, 70, 226, 211, 4, 39, 158, 121, 224, 169, 243, 2, 63, 119, 18, 148, 167, 138,
        203, 112, 231, 63, 144, 175, 226, 124, 173, 64, 30, 129,
    ],
    [
        2, 192, 6, 110, 16, 167, 42, 189, 43, 51, 195, 178, 20, 203, 62, 129, 188, 177, 182, 227,
        9, 97, 205, 35, 194, 2, 177, 134, 115, 191, 37, 67,
    ],
    [
        8, 44, 156, 55, 10, 13, 36, 244, 65, 111, 188, 65, 74, 55, 104, 31, 120, 68, 45, 39, 216,
        99, 133, 153, 28, 23, 214, 252, 12, 75, 125, 113,
    ],
    [
        16, 56, 150, 5, 174, 104, 141, 79, 20, 219, 133, 49, 34, 196, 125, 102, 168, 3, 199, 43,
        65, 88, 156, 177, 191, 134, 135, 65, 178, 6, 185, 187,
    ],
    [
        42, 115, 246, 121, 50, 140, 62, 171, 114, 74, 163, 229, 189, 191, 80, 179, 144, 53, 215,
        114, 159, 19, 91, 151, 9, 137, 15, 133, 197, 220, 94, 118,
    ],
    [
        34, 118, 49, 10, 167, 243, 52, 58, 40, 66, 20, 19, 157, 157, 169, 89, 190, 42, 49, 178,
        199, 8, 165, 248, 25, 84, 178, 101, 229, 58, 48, 184,
    ],
    [
        23, 126, 20, 83, 196, 70, 225, 176, 125, 43, 66, 51, 66, 81, 71, 9, 92, 79, 202, 187, 35,
        61, 35, 11, 109, 70, 162, 20, 217, 91, 40, 132,
    ],
    [
        14, 143, 238, 47, 228, 157, 163, 15, 222, 235, 72, 196, 46, 187, 68, 204, 110, 231, 5, 95,
        97, 251, 202, 94, 49, 59, 138, 95, 202, 131, 76, 71,
    ],
    [
        46, 196, 198, 94, 99, 120, 171, 140, 115, 48, 133, 79, 74, 112, 119, 193, 255, 146, 96,
        228, 72, 133, 196, 184, 29, 209, 49, 173, 58, 134, 205, 150,
    ],
    [
        0, 113, 61, 65, 236, 166, 53, 241, 23, 212, 236, 188, 235, 95, 58, 102, 220, 65, 66, 235,
        112, 181, 103, 101, 188, 53, 143, 27, 236, 64, 187, 155,
    ],
    [
        20, 57, 11, 224, 186, 239, 36, 155, 212, 124, 101, 221, 172, 101, 194, 229, 46, 133, 19,
        192, 129, 193, 205, 114, 201, 128, 6, 9, 142, 154, 143, 190,
    ],
];

/// Check compatibility with circomlibjs.
#[test]
fn circomlibjs_compat_1_to_12_inputs()
{
    for i in 1..13
    {
        let inputs = vec![Fr::from(1u64); i];
        assert_eq!(fr_to_be_bytes(&hash_n(&inputs).unwrap()), CIRCOMLIBJS_TEST_CASES[i - 1]);
    }
    for i in 1..13
    {
        let inputs = vec![Fr::from(2u64); i];
        assert!(fr_to_be_bytes(&hash_n(&inputs).unwrap()) != CIRCOMLIBJS_TEST_CASES[i - 1]);
    }
}

/// The thirteen element hash folds its middle ten elements in two halves.
#[test]
fn hash13_composition()
{
    let inputs: [Fr; 13] = core::array::from_fn(|i| Fr::from(i as u64));
    let left = hash_n(&inputs[1..6]).unwrap();
    let right = hash_n(&inputs[6..11]).unwrap();
    let expected = hash_n(&[inputs[0], left, right, inputs[11], inputs[12]]).unwrap();

    assert_eq!(hash13(inputs).unwrap(), expected);
}

/// The commitment hash depends on the order of its words.
#[test]
fn sha256_is_order_sensitive()
{
    let a = sha256_hash(&[Fr::from(1u64), Fr::from(2u64)]);
    let b = sha256_hash(&[Fr::from(2u64), Fr::from(1u64)]);
    assert!(a != b);
    assert_eq!(a, sha256_hash(&[Fr::from(1u64), Fr::from(2u64)]));
}
