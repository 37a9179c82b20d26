//! Application entity for SeaORM.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "applications")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub horse_name_ru: Option<String>,
    pub horse_name_en: Option<String>,
    pub horse_year: i32,
    pub status: String,
    pub mare_ownership_confirmed: bool,
    pub genetic_done_through_association: bool,
    pub genetic_pending: bool,
    pub created_at: DateTimeUtc,
    pub notes: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::application_file::Entity")]
    Files,
}

impl Related<super::application_file::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Files.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
