use canvas::Group;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct LayerId(pub u64);

/// Something that draws into one group of the map document.
pub trait Layer {
    fn id(&self) -> LayerId;
    fn group(&self) -> Group;
}
