/// First revision whose inventory objects carry junk/locked flags.
pub const ENHANCED_VERSION: i32 = 0x27;

/// Width of the value block that ends inventory objects and bank entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FooterWidth {
    /// quantity, quality, equipped slot, level
    Legacy,
    /// legacy values plus junk and locked
    Modern,
}

impl FooterWidth {
    pub fn for_revision(revision: i32) -> Self {
        if revision >= ENHANCED_VERSION {
            Self::Modern
        } else {
            Self::Legacy
        }
    }

    pub fn value_count(self) -> usize {
        match self {
            Self::Legacy => 4,
            Self::Modern => 6,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Allow an unreadable secondary-pack list to be dropped instead of
    /// failing the whole decode.
    pub auto_repair: bool,
}

/// State threaded through every decode call of one save.
#[derive(Debug, Clone)]
pub struct DecodeContext {
    pub revision: i32,
    pub auto_repair: bool,
    pub required_repair: bool,
}

impl DecodeContext {
    pub fn new(revision: i32, options: DecodeOptions) -> Self {
        Self {
            revision,
            auto_repair: options.auto_repair,
            required_repair: false,
        }
    }

    pub fn footer(&self) -> FooterWidth {
        FooterWidth::for_revision(self.revision)
    }

    pub fn is_enhanced(&self) -> bool {
        self.revision >= ENHANCED_VERSION
    }
}

#[derive(Debug, Clone, Copy)]
pub struct EncodeContext {
    pub revision: i32,
}

impl EncodeContext {
    pub fn new(revision: i32) -> Self {
        Self { revision }
    }

    pub fn footer(&self) -> FooterWidth {
        FooterWidth::for_revision(self.revision)
    }

    pub fn is_enhanced(&self) -> bool {
        self.revision >= ENHANCED_VERSION
    }
}
