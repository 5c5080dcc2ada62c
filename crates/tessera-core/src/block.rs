//! Block tags and block selectors

use std::fmt;
use std::str::FromStr;

use alloy::eips::{BlockId, BlockNumberOrTag};
use alloy::primitives::B256;
use serde::de::{self, Deserializer, Visitor};
use serde::Deserialize;

use crate::error::{Result, WalletError};

/// A block referenced by tag or number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlockTag {
    #[default]
    Latest,
    Pending,
    Earliest,
    Safe,
    Finalized,
    Number(u64),
}

impl BlockTag {
    pub fn to_block_id(self) -> BlockId {
        BlockId::Number(self.into())
    }
}

impl From<BlockTag> for BlockNumberOrTag {
    fn from(tag: BlockTag) -> Self {
        match tag {
            BlockTag::Latest => BlockNumberOrTag::Latest,
            BlockTag::Pending => BlockNumberOrTag::Pending,
            BlockTag::Earliest => BlockNumberOrTag::Earliest,
            BlockTag::Safe => BlockNumberOrTag::Safe,
            BlockTag::Finalized => BlockNumberOrTag::Finalized,
            BlockTag::Number(n) => BlockNumberOrTag::Number(n),
        }
    }
}

impl fmt::Display for BlockTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockTag::Latest => f.write_str("latest"),
            BlockTag::Pending => f.write_str("pending"),
            BlockTag::Earliest => f.write_str("earliest"),
            BlockTag::Safe => f.write_str("safe"),
            BlockTag::Finalized => f.write_str("finalized"),
            BlockTag::Number(n) => write!(f, "{:#x}", n),
        }
    }
}

impl FromStr for BlockTag {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "latest" => Ok(BlockTag::Latest),
            "pending" => Ok(BlockTag::Pending),
            "earliest" => Ok(BlockTag::Earliest),
            "safe" => Ok(BlockTag::Safe),
            "finalized" => Ok(BlockTag::Finalized),
            other => {
                let number = match other.strip_prefix("0x") {
                    Some(hex) => u64::from_str_radix(hex, 16),
                    None => other.parse::<u64>(),
                };
                number
                    .map(BlockTag::Number)
                    .map_err(|_| WalletError::InvalidBlockTag(trimmed.to_string()))
            }
        }
    }
}

impl<'de> Deserialize<'de> for BlockTag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct TagVisitor;

        impl<'de> Visitor<'de> for TagVisitor {
            type Value = BlockTag;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a block tag or block number")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<BlockTag, E> {
                Ok(BlockTag::Number(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<BlockTag, E> {
                u64::try_from(v)
                    .map(BlockTag::Number)
                    .map_err(|_| E::custom(format!("negative block number {}", v)))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<BlockTag, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(TagVisitor)
    }
}

/// Block lookup key: a 32-byte block hash or a tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockSelector {
    Hash(B256),
    Tag(BlockTag),
}

impl BlockSelector {
    pub fn to_block_id(self) -> BlockId {
        match self {
            BlockSelector::Hash(hash) => BlockId::hash(hash),
            BlockSelector::Tag(tag) => tag.to_block_id(),
        }
    }
}

impl FromStr for BlockSelector {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.len() == 66 && trimmed.starts_with("0x") {
            let hash = trimmed
                .parse::<B256>()
                .map_err(|e| WalletError::InvalidBlockTag(format!("{}: {}", trimmed, e)))?;
            return Ok(BlockSelector::Hash(hash));
        }
        trimmed.parse().map(BlockSelector::Tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_named_tags() {
        assert_eq!("latest".parse::<BlockTag>().unwrap(), BlockTag::Latest);
        assert_eq!("Pending".parse::<BlockTag>().unwrap(), BlockTag::Pending);
        assert_eq!("finalized".parse::<BlockTag>().unwrap(), BlockTag::Finalized);
    }

    #[test]
    fn test_numeric_tags() {
        assert_eq!("0x10".parse::<BlockTag>().unwrap(), BlockTag::Number(16));
        assert_eq!("16".parse::<BlockTag>().unwrap(), BlockTag::Number(16));
        assert!("sixteen".parse::<BlockTag>().is_err());
        assert_eq!(BlockTag::Number(16).to_string(), "0x10");
    }

    #[test]
    fn test_tag_from_json() {
        let tag: BlockTag = serde_json::from_value(json!(100)).unwrap();
        assert_eq!(tag, BlockTag::Number(100));
        let tag: BlockTag = serde_json::from_value(json!("safe")).unwrap();
        assert_eq!(tag, BlockTag::Safe);
    }

    #[test]
    fn test_selector() {
        let hash = format!("0x{}", "ab".repeat(32));
        assert!(matches!(
            hash.parse::<BlockSelector>().unwrap(),
            BlockSelector::Hash(_)
        ));
        assert_eq!(
            "earliest".parse::<BlockSelector>().unwrap(),
            BlockSelector::Tag(BlockTag::Earliest)
        );
        assert_eq!(
            BlockSelector::Tag(BlockTag::Number(5)).to_block_id(),
            BlockId::number(5)
        );
    }
}
