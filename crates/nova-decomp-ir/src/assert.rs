use crate::exprent::Exprent;

#[derive(Debug, Clone, PartialEq)]
pub struct AssertExprent {
    pub condition: Box<Exprent>,
    pub message: Option<Box<Exprent>>,
}

impl AssertExprent {
    pub fn new(condition: Exprent, message: Option<Exprent>) -> Self {
        Self {
            condition: Box::new(condition),
            message: message.map(Box::new),
        }
    }
}
