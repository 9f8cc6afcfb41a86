use std::fmt;

use serde::{Deserialize, Serialize};

/// The seven stages of the Cyber Kill Chain, in attack order.
///
/// This set is a constant of the system and is never derived from data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum KillChainStage {
    Recon,
    Weaponize,
    Delivery,
    Exploit,
    Install,
    C2,
    Actions,
}

impl KillChainStage {
    pub const ALL: [KillChainStage; 7] = [
        KillChainStage::Recon,
        KillChainStage::Weaponize,
        KillChainStage::Delivery,
        KillChainStage::Exploit,
        KillChainStage::Install,
        KillChainStage::C2,
        KillChainStage::Actions,
    ];

    pub const COUNT: usize = Self::ALL.len();

    /// Short label used on the stage diagram.
    pub fn label(&self) -> &'static str {
        match self {
            KillChainStage::Recon => "Recon",
            KillChainStage::Weaponize => "Weaponize",
            KillChainStage::Delivery => "Delivery",
            KillChainStage::Exploit => "Exploit",
            KillChainStage::Install => "Install",
            KillChainStage::C2 => "C2",
            KillChainStage::Actions => "Actions",
        }
    }

    /// 1-based position in the chain.
    pub fn ordinal(&self) -> usize {
        *self as usize + 1
    }

    pub fn next(&self) -> Option<KillChainStage> {
        Self::ALL.get(self.ordinal()).copied()
    }
}

impl fmt::Display for KillChainStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
