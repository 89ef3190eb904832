//! Derivative and residual flag sets.
//!
//! [`EvalFlags`] says which derivatives of a field the mesh must evaluate
//! at quadrature points; [`ResidualFlags`] says which residual slots a field
//! submits back for integration.

use std::fmt;

/// Which quantities to evaluate for a field at quadrature points.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct EvalFlags {
    /// Point values.
    pub value: bool,
    /// First derivatives.
    pub gradient: bool,
    /// Second derivatives.
    pub hessian: bool,
}

impl EvalFlags {
    /// Nothing is evaluated.
    pub const NONE: Self = Self {
        value: false,
        gradient: false,
        hessian: false,
    };
    /// Values only.
    pub const VALUE: Self = Self {
        value: true,
        gradient: false,
        hessian: false,
    };
    /// Gradients only.
    pub const GRADIENT: Self = Self {
        value: false,
        gradient: true,
        hessian: false,
    };
    /// Values and gradients.
    pub const VALUE_GRADIENT: Self = Self {
        value: true,
        gradient: true,
        hessian: false,
    };
    /// Everything.
    pub const ALL: Self = Self {
        value: true,
        gradient: true,
        hessian: true,
    };

    /// Whether no quantity is requested.
    pub fn is_empty(&self) -> bool {
        !(self.value || self.gradient || self.hessian)
    }

    /// Flags requested by either operand.
    pub fn union(&self, other: Self) -> Self {
        Self {
            value: self.value || other.value,
            gradient: self.gradient || other.gradient,
            hessian: self.hessian || other.hessian,
        }
    }
}

impl fmt::Display for EvalFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if self.value {
            parts.push("value");
        }
        if self.gradient {
            parts.push("gradient");
        }
        if self.hessian {
            parts.push("hessian");
        }
        if parts.is_empty() {
            write!(f, "none")
        } else {
            write!(f, "{}", parts.join("+"))
        }
    }
}

/// Which residual slots a field submits for integration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ResidualFlags {
    /// Residual tested against shape-function values.
    pub value: bool,
    /// Residual tested against shape-function gradients.
    pub gradient: bool,
}

impl ResidualFlags {
    /// No residual output.
    pub const NONE: Self = Self {
        value: false,
        gradient: false,
    };
    /// Value residual only.
    pub const VALUE: Self = Self {
        value: true,
        gradient: false,
    };
    /// Gradient residual only.
    pub const GRADIENT: Self = Self {
        value: false,
        gradient: true,
    };
    /// Both residual slots.
    pub const BOTH: Self = Self {
        value: true,
        gradient: true,
    };

    /// Whether the field submits nothing.
    pub fn is_empty(&self) -> bool {
        !(self.value || self.gradient)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_combines_requests() {
        let f = EvalFlags::VALUE.union(EvalFlags::GRADIENT);
        assert_eq!(f, EvalFlags::VALUE_GRADIENT);
        assert!(!f.hessian);
        assert!(EvalFlags::NONE.is_empty());
    }

    #[test]
    fn display_lists_requested_parts() {
        assert_eq!(EvalFlags::ALL.to_string(), "value+gradient+hessian");
        assert_eq!(EvalFlags::NONE.to_string(), "none");
    }
}
