// SPDX-FileCopyrightText: 2021 David Ruescas <david@sequentech.io>
//
// SPDX-License-Identifier: AGPL-3.0-only
//! Feldman verifiable Shamir sharing in the exponent.
//!
//! Tellers are numbered from 1, the secret is the polynomial at 0.
use num_bigint::BigUint;
use num_traits::{One, Zero};

use crate::context::BigintCtx;

/// Random polynomial of degree `threshold - 1` and its Feldman commitments
/// `g^a_k`.
pub fn gen_coefficients(threshold: usize, ctx: &BigintCtx) -> (Vec<BigUint>, Vec<BigUint>) {
    let coefficients: Vec<BigUint> = (0..threshold).map(|_| ctx.rnd_exp()).collect();
    let commitments = coefficients.iter().map(|c| ctx.gmod_pow(c)).collect();

    (coefficients, commitments)
}

pub fn eval_poly(trustee: usize, threshold: usize, coefficients: &[BigUint], ctx: &BigintCtx) -> BigUint {
    let mut sum = coefficients[0].clone();
    let mut power = BigUint::one();
    let trustee_exp = BigUint::from(trustee as u64);

    for coefficient in coefficients.iter().take(threshold).skip(1) {
        power = ctx.exp_mul(&power, &trustee_exp);
        sum = ctx.exp_add(&sum, &ctx.exp_mul(coefficient, &power));
    }
    sum
}

/// `g^f(trustee)` computed from the public commitments alone.
pub fn verification_key_factor(
    commitments: &[BigUint],
    threshold: usize,
    trustee: usize,
    ctx: &BigintCtx,
) -> BigUint {
    let trustee_exp = BigUint::from(trustee as u64);
    let mut power = BigUint::one();
    let mut ret = BigUint::one();

    for commitment in commitments.iter().take(threshold) {
        ret = ctx.mul(&ret, &ctx.emod_pow(commitment, &power));
        power = ctx.exp_mul(&power, &trustee_exp);
    }

    ret
}

/// Lagrange coefficient at zero for `trustee` over the `present` set.
pub fn lagrange(trustee: usize, present: &[usize], ctx: &BigintCtx) -> BigUint {
    let mut numerator = BigUint::one();
    let mut denominator = BigUint::one();
    let trustee_exp = BigUint::from(trustee as u64);

    for other in present {
        if *other == trustee {
            continue;
        }
        let other_exp = BigUint::from(*other as u64);
        numerator = ctx.exp_mul(&numerator, &other_exp);
        denominator = ctx.exp_mul(&denominator, &ctx.exp_sub(&other_exp, &trustee_exp));
    }
    if denominator.is_zero() {
        return BigUint::zero();
    }

    ctx.exp_mul(&numerator, &ctx.exp_inv(&denominator))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::tests::ctx_256;
    use crate::elgamal::PublicKey;

    #[test]
    fn test_shares_match_commitments() {
        let ctx = ctx_256();
        let threshold = 3;
        let (coefficients, commitments) = gen_coefficients(threshold, &ctx);
        for trustee in 1..=5 {
            let share = eval_poly(trustee, threshold, &coefficients, &ctx);
            let vkf = verification_key_factor(&commitments, threshold, trustee, &ctx);
            assert_eq!(ctx.gmod_pow(&share), vkf);
        }
    }

    #[test]
    fn test_lagrange_interpolation() {
        let ctx = ctx_256();
        let threshold = 3;
        let (coefficients, _) = gen_coefficients(threshold, &ctx);
        let shares: Vec<BigUint> = (1..=5)
            .map(|t| eval_poly(t, threshold, &coefficients, &ctx))
            .collect();

        for present in [vec![1, 2, 3], vec![2, 4, 5], vec![1, 3, 5, 4]] {
            let secret = present.iter().fold(BigUint::zero(), |acc, t| {
                let term = ctx.exp_mul(&shares[t - 1], &lagrange(*t, &present, &ctx));
                ctx.exp_add(&acc, &term)
            });
            assert_eq!(secret, coefficients[0]);
        }

        let present = vec![1, 2];
        let secret = present.iter().fold(BigUint::zero(), |acc, t| {
            let term = ctx.exp_mul(&shares[t - 1], &lagrange(*t, &present, &ctx));
            ctx.exp_add(&acc, &term)
        });
        assert_ne!(secret, coefficients[0]);
    }

    #[test]
    fn test_threshold_decryption() {
        let ctx = ctx_256();
        let (num_trustees, threshold) = (4, 3);
        let polys: Vec<(Vec<BigUint>, Vec<BigUint>)> = (0..num_trustees)
            .map(|_| gen_coefficients(threshold, &ctx))
            .collect();
        let pk_element = polys
            .iter()
            .fold(BigUint::one(), |acc, (_, c)| ctx.mul(&acc, &c[0]));
        // each trustee's secret share sums the shares it received
        let secret_shares: Vec<BigUint> = (1..=num_trustees)
            .map(|t| {
                polys.iter().fold(BigUint::zero(), |acc, (coefficients, _)| {
                    ctx.exp_add(&acc, &eval_poly(t, threshold, coefficients, &ctx))
                })
            })
            .collect();

        let pk = PublicKey::from_element(&pk_element, &ctx);
        let plaintext = ctx.rnd();
        let c = pk.encrypt(&plaintext);

        let present = [2usize, 3, 4];
        let divider = present.iter().fold(BigUint::one(), |acc, t| {
            let factor = ctx.emod_pow(&c.alpha, &secret_shares[t - 1]);
            ctx.mul(&acc, &ctx.emod_pow(&factor, &lagrange(*t, &present, &ctx)))
        });
        assert_eq!(ctx.div(&c.beta, &divider), plaintext);
    }
}
