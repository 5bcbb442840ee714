use crate::exprent::Exprent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorKind {
    Enter,
    Exit,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonitorExprent {
    pub kind: MonitorKind,
    pub value: Box<Exprent>,
}

impl MonitorExprent {
    pub fn enter(value: Exprent) -> Self {
        Self {
            kind: MonitorKind::Enter,
            value: Box::new(value),
        }
    }

    pub fn exit(value: Exprent) -> Self {
        Self {
            kind: MonitorKind::Exit,
            value: Box::new(value),
        }
    }
}
