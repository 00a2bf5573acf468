use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_reference_tables::Migration),
            Box::new(m20250101_000002_create_client_tables::Migration),
            Box::new(m20250101_000003_create_schedule_tables::Migration),
            Box::new(m20250101_000004_create_volunteer_assignments_table::Migration),
            Box::new(m20250101_000005_create_inventory_tables::Migration),
        ]
    }
}

// Migration implementations

mod m20250101_000001_create_reference_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000001_create_reference_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Routes::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Routes::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Routes::Name).string().not_null())
                        .col(ColumnDef::new(Routes::Description).string().null())
                        .col(
                            ColumnDef::new(Routes::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Routes::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Volunteers::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Volunteers::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Volunteers::FirstName).string().not_null())
                        .col(ColumnDef::new(Volunteers::LastName).string().not_null())
                        .col(ColumnDef::new(Volunteers::Email).string().null())
                        .col(ColumnDef::new(Volunteers::Phone).string().null())
                        .col(
                            ColumnDef::new(Volunteers::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Volunteers::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(MealTypes::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(MealTypes::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(MealTypes::Name)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(MealTypes::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(DietaryRestrictions::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(DietaryRestrictions::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(DietaryRestrictions::Name)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(DietaryRestrictions::Description).string().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(EligibilityCriteria::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(EligibilityCriteria::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(EligibilityCriteria::Name)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(EligibilityCriteria::Description).string().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(InventoryCategories::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(InventoryCategories::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(InventoryCategories::Name)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(InventoryCategories::Description).string().null())
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(InventoryCategories::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(EligibilityCriteria::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(DietaryRestrictions::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(MealTypes::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Volunteers::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Routes::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Routes {
        Table,
        Id,
        Name,
        Description,
        IsActive,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum Volunteers {
        Table,
        Id,
        FirstName,
        LastName,
        Email,
        Phone,
        IsActive,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum MealTypes {
        Table,
        Id,
        Name,
        IsActive,
    }

    #[derive(DeriveIden)]
    enum DietaryRestrictions {
        Table,
        Id,
        Name,
        Description,
    }

    #[derive(DeriveIden)]
    enum EligibilityCriteria {
        Table,
        Id,
        Name,
        Description,
    }

    #[derive(DeriveIden)]
    enum InventoryCategories {
        Table,
        Id,
        Name,
        Description,
    }
}

mod m20250101_000002_create_client_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000002_create_client_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Clients::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Clients::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Clients::FirstName).string().not_null())
                        .col(ColumnDef::new(Clients::LastName).string().not_null())
                        .col(ColumnDef::new(Clients::Address).string().not_null())
                        .col(ColumnDef::new(Clients::Phone).string().null())
                        .col(ColumnDef::new(Clients::RouteId).integer().null())
                        .col(
                            ColumnDef::new(Clients::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Clients::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Clients::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_clients_route_id")
                                .from(Clients::Table, Clients::RouteId)
                                .to(Routes::Table, Routes::Id)
                                .on_delete(ForeignKeyAction::SetNull),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_clients_route_id")
                        .table(Clients::Table)
                        .col(Clients::RouteId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ClientDietaryRestrictions::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ClientDietaryRestrictions::ClientId)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ClientDietaryRestrictions::DietaryRestrictionId)
                                .integer()
                                .not_null(),
                        )
                        .primary_key(
                            Index::create()
                                .col(ClientDietaryRestrictions::ClientId)
                                .col(ClientDietaryRestrictions::DietaryRestrictionId),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_client_dietary_restrictions_client_id")
                                .from(
                                    ClientDietaryRestrictions::Table,
                                    ClientDietaryRestrictions::ClientId,
                                )
                                .to(Clients::Table, Clients::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_client_dietary_restrictions_restriction_id")
                                .from(
                                    ClientDietaryRestrictions::Table,
                                    ClientDietaryRestrictions::DietaryRestrictionId,
                                )
                                .to(DietaryRestrictions::Table, DietaryRestrictions::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ClientEligibilityCriteria::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ClientEligibilityCriteria::ClientId)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ClientEligibilityCriteria::EligibilityCriterionId)
                                .integer()
                                .not_null(),
                        )
                        .primary_key(
                            Index::create()
                                .col(ClientEligibilityCriteria::ClientId)
                                .col(ClientEligibilityCriteria::EligibilityCriterionId),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_client_eligibility_criteria_client_id")
                                .from(
                                    ClientEligibilityCriteria::Table,
                                    ClientEligibilityCriteria::ClientId,
                                )
                                .to(Clients::Table, Clients::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_client_eligibility_criteria_criterion_id")
                                .from(
                                    ClientEligibilityCriteria::Table,
                                    ClientEligibilityCriteria::EligibilityCriterionId,
                                )
                                .to(EligibilityCriteria::Table, EligibilityCriteria::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ServiceAuthorizations::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ServiceAuthorizations::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(ServiceAuthorizations::ClientId)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ServiceAuthorizations::ServiceType)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ServiceAuthorizations::AuthorizedUnits)
                                .integer()
                                .not_null()
                                .check(Expr::col(ServiceAuthorizations::AuthorizedUnits).gte(0)),
                        )
                        .col(
                            ColumnDef::new(ServiceAuthorizations::StartDate)
                                .date()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ServiceAuthorizations::EndDate).date().null())
                        .col(
                            ColumnDef::new(ServiceAuthorizations::AuthorizationNumber)
                                .string()
                                .null(),
                        )
                        .col(ColumnDef::new(ServiceAuthorizations::Notes).text().null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_service_authorizations_client_id")
                                .from(ServiceAuthorizations::Table, ServiceAuthorizations::ClientId)
                                .to(Clients::Table, Clients::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_service_authorizations_client_id")
                        .table(ServiceAuthorizations::Table)
                        .col(ServiceAuthorizations::ClientId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ServiceAuthorizations::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(ClientEligibilityCriteria::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(ClientDietaryRestrictions::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Clients::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Clients {
        Table,
        Id,
        FirstName,
        LastName,
        Address,
        Phone,
        RouteId,
        IsActive,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum ClientDietaryRestrictions {
        Table,
        ClientId,
        DietaryRestrictionId,
    }

    #[derive(DeriveIden)]
    enum ClientEligibilityCriteria {
        Table,
        ClientId,
        EligibilityCriterionId,
    }

    #[derive(DeriveIden)]
    enum ServiceAuthorizations {
        Table,
        Id,
        ClientId,
        ServiceType,
        AuthorizedUnits,
        StartDate,
        EndDate,
        AuthorizationNumber,
        Notes,
    }

    #[derive(DeriveIden)]
    enum Routes {
        Table,
        Id,
    }

    #[derive(DeriveIden)]
    enum DietaryRestrictions {
        Table,
        Id,
    }

    #[derive(DeriveIden)]
    enum EligibilityCriteria {
        Table,
        Id,
    }
}

mod m20250101_000003_create_schedule_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000003_create_schedule_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(RecurringDeliverySchedules::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(RecurringDeliverySchedules::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        // one schedule per client
                        .col(
                            ColumnDef::new(RecurringDeliverySchedules::ClientId)
                                .integer()
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(RecurringDeliverySchedules::RecurrencePattern)
                                .string_len(50)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(RecurringDeliverySchedules::StartDate)
                                .date()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(RecurringDeliverySchedules::EndDate)
                                .date()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(RecurringDeliverySchedules::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(RecurringDeliverySchedules::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(RecurringDeliverySchedules::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_recurring_delivery_schedules_client_id")
                                .from(
                                    RecurringDeliverySchedules::Table,
                                    RecurringDeliverySchedules::ClientId,
                                )
                                .to(Clients::Table, Clients::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ScheduleDetails::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ScheduleDetails::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(ScheduleDetails::ScheduleId).integer().not_null())
                        .col(
                            ColumnDef::new(ScheduleDetails::Position)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(ScheduleDetails::DayOfWeek)
                                .string_len(16)
                                .not_null(),
                        )
                        .col(ColumnDef::new(ScheduleDetails::MealTypeId).integer().not_null())
                        .col(
                            ColumnDef::new(ScheduleDetails::Quantity)
                                .integer()
                                .not_null()
                                .check(Expr::col(ScheduleDetails::Quantity).between(1, 10)),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_schedule_details_schedule_id")
                                .from(ScheduleDetails::Table, ScheduleDetails::ScheduleId)
                                .to(
                                    RecurringDeliverySchedules::Table,
                                    RecurringDeliverySchedules::Id,
                                )
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_schedule_details_meal_type_id")
                                .from(ScheduleDetails::Table, ScheduleDetails::MealTypeId)
                                .to(MealTypes::Table, MealTypes::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_schedule_details_schedule_id")
                        .table(ScheduleDetails::Table)
                        .col(ScheduleDetails::ScheduleId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ScheduleDetails::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(RecurringDeliverySchedules::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum RecurringDeliverySchedules {
        Table,
        Id,
        ClientId,
        RecurrencePattern,
        StartDate,
        EndDate,
        IsActive,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum ScheduleDetails {
        Table,
        Id,
        ScheduleId,
        Position,
        DayOfWeek,
        MealTypeId,
        Quantity,
    }

    #[derive(DeriveIden)]
    enum Clients {
        Table,
        Id,
    }

    #[derive(DeriveIden)]
    enum MealTypes {
        Table,
        Id,
    }
}

mod m20250101_000004_create_volunteer_assignments_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000004_create_volunteer_assignments_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(VolunteerAssignments::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(VolunteerAssignments::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(VolunteerAssignments::VolunteerId)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(VolunteerAssignments::RouteId).integer().not_null())
                        .col(
                            ColumnDef::new(VolunteerAssignments::ScheduledDate)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(VolunteerAssignments::ScheduledDay)
                                .date()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(VolunteerAssignments::ShiftType)
                                .string_len(50)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(VolunteerAssignments::Status)
                                .string_len(32)
                                .not_null()
                                .default("Scheduled"),
                        )
                        .col(ColumnDef::new(VolunteerAssignments::Notes).text().null())
                        .col(
                            ColumnDef::new(VolunteerAssignments::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(VolunteerAssignments::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_volunteer_assignments_volunteer_id")
                                .from(
                                    VolunteerAssignments::Table,
                                    VolunteerAssignments::VolunteerId,
                                )
                                .to(Volunteers::Table, Volunteers::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_volunteer_assignments_route_id")
                                .from(VolunteerAssignments::Table, VolunteerAssignments::RouteId)
                                .to(Routes::Table, Routes::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_volunteer_assignments_route_day")
                        .table(VolunteerAssignments::Table)
                        .col(VolunteerAssignments::RouteId)
                        .col(VolunteerAssignments::ScheduledDay)
                        .to_owned(),
                )
                .await?;

            // Backstop for the double-booking check: at most one live
            // assignment per volunteer, day and shift.
            manager
                .get_connection()
                .execute_unprepared(
                    "CREATE UNIQUE INDEX IF NOT EXISTS uq_volunteer_assignments_live_slot \
                     ON volunteer_assignments (volunteer_id, scheduled_day, shift_type) \
                     WHERE status <> 'Cancelled'",
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(VolunteerAssignments::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum VolunteerAssignments {
        Table,
        Id,
        VolunteerId,
        RouteId,
        ScheduledDate,
        ScheduledDay,
        ShiftType,
        Status,
        Notes,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum Volunteers {
        Table,
        Id,
    }

    #[derive(DeriveIden)]
    enum Routes {
        Table,
        Id,
    }
}

mod m20250101_000005_create_inventory_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000005_create_inventory_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(InventoryItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(InventoryItems::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(InventoryItems::CategoryId).integer().not_null())
                        .col(ColumnDef::new(InventoryItems::Name).string().not_null())
                        .col(ColumnDef::new(InventoryItems::Unit).string().not_null())
                        .col(
                            ColumnDef::new(InventoryItems::CurrentQuantity)
                                .integer()
                                .not_null()
                                .default(0)
                                .check(Expr::col(InventoryItems::CurrentQuantity).gte(0)),
                        )
                        .col(
                            ColumnDef::new(InventoryItems::ReorderThreshold)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(InventoryItems::ReorderQuantity)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(InventoryItems::UnitCost)
                                .decimal_len(12, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(InventoryItems::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryItems::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_inventory_items_category_id")
                                .from(InventoryItems::Table, InventoryItems::CategoryId)
                                .to(InventoryCategories::Table, InventoryCategories::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(InventoryTransactions::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(InventoryTransactions::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(InventoryTransactions::ItemId)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryTransactions::SignedQuantity)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryTransactions::TransactionType)
                                .string_len(32)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryTransactions::UserId)
                                .string_len(100)
                                .not_null(),
                        )
                        .col(ColumnDef::new(InventoryTransactions::Notes).text().null())
                        .col(
                            ColumnDef::new(InventoryTransactions::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_inventory_transactions_item_id")
                                .from(InventoryTransactions::Table, InventoryTransactions::ItemId)
                                .to(InventoryItems::Table, InventoryItems::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_inventory_transactions_item_id")
                        .table(InventoryTransactions::Table)
                        .col(InventoryTransactions::ItemId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_inventory_transactions_created_at")
                        .table(InventoryTransactions::Table)
                        .col(InventoryTransactions::CreatedAt)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(InventoryTransactions::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(InventoryItems::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum InventoryItems {
        Table,
        Id,
        CategoryId,
        Name,
        Unit,
        CurrentQuantity,
        ReorderThreshold,
        ReorderQuantity,
        UnitCost,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum InventoryTransactions {
        Table,
        Id,
        ItemId,
        SignedQuantity,
        TransactionType,
        UserId,
        Notes,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum InventoryCategories {
        Table,
        Id,
    }
}
