pub mod directorymodel;
pub mod marketmodel;
pub mod profilemodel;
pub mod usermodel;
