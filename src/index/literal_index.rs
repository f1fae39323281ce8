//! Literal keying for the term index
//!
//! The tree indexes terms, so literals are keyed as synthesized terms: an
//! atom `p(t1,...,tn)` with a polarity becomes `⟨p,polarity⟩(t1,...,tn)`
//! where `⟨p,polarity⟩` is a reserved function symbol, one per (predicate,
//! polarity) pair. The `+`/`~` prefix cannot appear in user symbol names,
//! so the reserved namespace never collides.
//!
//! Retrieval over literal entries then has exactly the term-tree semantics:
//! unifying two atom keys unifies the atoms argument-wise, and polarity or
//! predicate mismatches fail at the root symbol.

use crate::fol::{Context, Literal, TermId};

/// Build the index key term for a literal, with the stated polarity.
pub fn atom_key(ctx: &mut Context, lit: &Literal, polarity: bool) -> TermId {
    let prefix = if polarity { '+' } else { '~' };
    let name = format!("{}{}", prefix, ctx.syms.resolve_predicate(lit.predicate));
    let f = ctx.syms.intern_function(&name);
    ctx.bank.function(f, lit.args.clone())
}

/// Key for the literal as it stands.
pub fn literal_key(ctx: &mut Context, lit: &Literal) -> TermId {
    atom_key(ctx, lit, lit.polarity)
}

/// Key for the literal's complement (resolution partners).
pub fn complement_key(ctx: &mut Context, lit: &Literal) -> TermId {
    atom_key(ctx, lit, !lit.polarity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fol::{Substitution, QUERY, RESULT};

    #[test]
    fn test_same_literal_same_key() {
        let mut ctx = Context::new();
        let p = ctx.syms.intern_predicate("p");
        let a = ctx.bank.constant(ctx.syms.intern_constant("a"));

        let lit = Literal::positive(p, vec![a]);
        let k1 = literal_key(&mut ctx, &lit);
        let k2 = literal_key(&mut ctx, &lit);
        assert_eq!(k1, k2);
    }

    #[test]
    fn test_polarity_separates_keys() {
        let mut ctx = Context::new();
        let p = ctx.syms.intern_predicate("p");
        let a = ctx.bank.constant(ctx.syms.intern_constant("a"));

        let pos = Literal::positive(p, vec![a]);
        let neg = Literal::negative(p, vec![a]);
        assert_ne!(literal_key(&mut ctx, &pos), literal_key(&mut ctx, &neg));
        assert_eq!(literal_key(&mut ctx, &pos), complement_key(&mut ctx, &neg));
    }

    #[test]
    fn test_keys_unify_iff_atoms_do() {
        let mut ctx = Context::new();
        let p = ctx.syms.intern_predicate("p");
        let x = ctx.bank.variable(ctx.syms.intern_variable("X"));
        let a = ctx.bank.constant(ctx.syms.intern_constant("a"));
        let b = ctx.bank.constant(ctx.syms.intern_constant("b"));

        let lit_x = Literal::positive(p, vec![x, b]);
        let lit_a = Literal::positive(p, vec![a, b]);
        let lit_bad = Literal::positive(p, vec![a, a]);

        let kx = literal_key(&mut ctx, &lit_x);
        let ka = literal_key(&mut ctx, &lit_a);
        let kbad = literal_key(&mut ctx, &lit_bad);

        let mut subst = Substitution::new();
        assert!(subst.unify(&ctx.bank, kx, QUERY, ka, RESULT));
        subst.reset();
        assert!(!subst.unify(&ctx.bank, kx, QUERY, kbad, RESULT));
    }
}
