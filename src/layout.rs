use std::fmt;

use crate::config::Domains;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum SectionId {
    Cpu,
    Memory,
    Disks,
    Network,
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SectionId::Cpu => write!(f, "CPU"),
            SectionId::Memory => write!(f, "Memory"),
            SectionId::Disks => write!(f, "Disks"),
            SectionId::Network => write!(f, "Network"),
        }
    }
}

pub struct Layout {
    pub sections: Vec<SectionId>,
}

impl Layout {
    /// Section ordering for the enabled domains: CPU, memory, disks, network.
    pub fn for_domains(domains: &Domains) -> Self {
        let sections = [
            (domains.cpu, SectionId::Cpu),
            (domains.mem, SectionId::Memory),
            (domains.disks, SectionId::Disks),
            (domains.net, SectionId::Network),
        ]
        .into_iter()
        .filter_map(|(enabled, id)| enabled.then_some(id))
        .collect();
        Self { sections }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_domains_in_fixed_order() {
        let layout = Layout::for_domains(&Domains::all());
        assert_eq!(
            layout.sections,
            vec![SectionId::Cpu, SectionId::Memory, SectionId::Disks, SectionId::Network]
        );
    }

    #[test]
    fn disabled_domains_are_left_out() {
        let layout = Layout::for_domains(&Domains {
            net: true,
            mem: true,
            ..Domains::none()
        });
        assert_eq!(layout.sections, vec![SectionId::Memory, SectionId::Network]);
    }

    #[test]
    fn section_titles() {
        assert_eq!(SectionId::Network.to_string(), "Network");
        assert_eq!(SectionId::Cpu.to_string(), "CPU");
    }
}
