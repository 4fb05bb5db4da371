// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! A minimal declarative bitflags macro.
//!
//! The engine only needs flag sets for buffer usage declarations, so a small
//! in-house macro keeps the dependency graph flat.

/// Declares a transparent bitflag newtype with associated flag constants and
/// the usual set operations (`|`, `|=`, `&`, `contains`, `intersects`).
#[macro_export]
macro_rules! mitos_bitflags {
    (
        $(#[$outer:meta])*
        $vis:vis struct $Name:ident: $T:ty {
            $(
                $(#[$inner:meta])*
                const $Flag:ident = $value:expr;
            )*
        }
    ) => {
        $(#[$outer])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash)]
        $vis struct $Name {
            bits: $T,
        }

        impl $Name {
            $(
                $(#[$inner])*
                pub const $Flag: Self = Self { bits: $value };
            )*

            /// Returns an empty set of flags.
            #[inline]
            pub const fn empty() -> Self {
                Self { bits: 0 }
            }

            /// Returns the raw bit representation of the flag set.
            #[inline]
            pub const fn bits(&self) -> $T {
                self.bits
            }

            /// Builds a flag set directly from raw bits, keeping unknown bits.
            #[inline]
            pub const fn from_bits_retain(bits: $T) -> Self {
                Self { bits }
            }

            /// Returns `true` if no flags are set.
            #[inline]
            pub const fn is_empty(&self) -> bool {
                self.bits == 0
            }

            /// Returns `true` if every flag in `other` is also set in `self`.
            #[inline]
            pub const fn contains(&self, other: Self) -> bool {
                (self.bits & other.bits) == other.bits
            }

            /// Returns `true` if `self` and `other` share at least one flag.
            #[inline]
            pub const fn intersects(&self, other: Self) -> bool {
                (self.bits & other.bits) != 0
            }
        }

        impl core::ops::BitOr for $Name {
            type Output = Self;
            #[inline]
            fn bitor(self, rhs: Self) -> Self {
                Self {
                    bits: self.bits | rhs.bits,
                }
            }
        }

        impl core::ops::BitOrAssign for $Name {
            #[inline]
            fn bitor_assign(&mut self, rhs: Self) {
                self.bits |= rhs.bits;
            }
        }

        impl core::ops::BitAnd for $Name {
            type Output = Self;
            #[inline]
            fn bitand(self, rhs: Self) -> Self {
                Self {
                    bits: self.bits & rhs.bits,
                }
            }
        }

        impl core::fmt::Debug for $Name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, concat!(stringify!($Name), "({:#b})"), self.bits)
            }
        }
    };
}

#[cfg(test)]
mod tests {
    mitos_bitflags! {
        /// Flags used only by this test module.
        pub struct TestFlags: u32 {
            /// First flag.
            const A = 1 << 0;
            /// Second flag.
            const B = 1 << 1;
            /// Third flag.
            const C = 1 << 2;
        }
    }

    #[test]
    fn union_and_contains() {
        let ab = TestFlags::A | TestFlags::B;
        assert!(ab.contains(TestFlags::A));
        assert!(ab.contains(TestFlags::B));
        assert!(!ab.contains(TestFlags::C));
        assert!(ab.contains(TestFlags::A | TestFlags::B));
        assert!(!ab.contains(TestFlags::A | TestFlags::C));
    }

    #[test]
    fn intersects_and_empty() {
        let a = TestFlags::A;
        assert!(a.intersects(TestFlags::A | TestFlags::C));
        assert!(!a.intersects(TestFlags::B));
        assert!(TestFlags::empty().is_empty());
        assert_eq!((a & TestFlags::B).bits(), 0);
    }

    #[test]
    fn or_assign_accumulates() {
        let mut flags = TestFlags::empty();
        flags |= TestFlags::B;
        flags |= TestFlags::C;
        assert_eq!(flags.bits(), 0b110);
        assert_eq!(TestFlags::from_bits_retain(0b110), flags);
    }
}
