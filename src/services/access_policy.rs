// src/services/access_policy.rs
//
// Avaliador de acesso: funções puras sobre (Caller, EntityKind).
// Nada aqui toca no banco; o `Caller` já chega materializado.

use crate::{
    common::error::AppError,
    models::{
        access::{Domain, EntityKind, Operation, Visibility},
        auth::{Caller, Group},
    },
};

const MASK: &str = "*****";

/// Linhas visíveis para o chamador em um tipo de registro.
pub fn visibility(caller: &Caller, kind: EntityKind) -> Visibility {
    let shared = match kind {
        // Dados técnicos são públicos para qualquer autenticado
        EntityKind::TechData => true,
        EntityKind::Task | EntityKind::Tender => {
            caller.is_admin || caller.in_group(Group::Tech)
        }
        EntityKind::Lead | EntityKind::Customer | EntityKind::Payment | EntityKind::SalesTask => {
            caller.is_admin || caller.in_group(Group::Sales) || caller.in_group(Group::Tech)
        }
    };

    if shared {
        Visibility::All
    } else {
        Visibility::OwnedBy(caller.user_id)
    }
}

/// Escrita exige o grupo do domínio ou admin. Dono da linha não importa.
pub fn can_write(caller: &Caller, kind: EntityKind) -> bool {
    if caller.is_admin {
        return true;
    }
    match kind.domain() {
        Domain::Sales => caller.in_group(Group::Sales),
        Domain::Tech => caller.in_group(Group::Tech),
    }
}

/// Decide a operação e devolve o escopo de linhas em que ela vale.
pub fn authorize(
    caller: &Caller,
    kind: EntityKind,
    operation: Operation,
) -> Result<Visibility, AppError> {
    if operation == Operation::Write && !can_write(caller, kind) {
        tracing::warn!(
            user_id = caller.user_id,
            entity = %kind,
            "🚫 Escrita negada"
        );
        return Err(AppError::PermissionDenied(format!("escrita em {kind}")));
    }
    Ok(visibility(caller, kind))
}

/// Técnicos (não admin) recebem o contato do lead mascarado.
pub fn masks_lead_contact(caller: &Caller) -> bool {
    caller.in_group(Group::Tech) && !caller.is_admin
}

/// Troca os últimos cinco caracteres por `*****` quando o contato é maior que cinco.
pub fn mask_contact(contact: &str) -> String {
    let len = contact.chars().count();
    if len <= MASK.len() {
        return contact.to_string();
    }
    let kept: String = contact.chars().take(len - MASK.len()).collect();
    format!("{kept}{MASK}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn caller(is_admin: bool, groups: &[Group]) -> Caller {
        Caller {
            user_id: 42,
            username: "tester".into(),
            is_admin,
            groups: groups.iter().copied().collect(),
        }
    }

    #[rstest]
    #[case(EntityKind::Lead)]
    #[case(EntityKind::Customer)]
    #[case(EntityKind::Payment)]
    #[case(EntityKind::SalesTask)]
    fn sales_domain_is_shared_with_both_groups(#[case] kind: EntityKind) {
        assert_eq!(visibility(&caller(false, &[Group::Sales]), kind), Visibility::All);
        assert_eq!(visibility(&caller(false, &[Group::Tech]), kind), Visibility::All);
        assert_eq!(visibility(&caller(true, &[]), kind), Visibility::All);
        assert_eq!(visibility(&caller(false, &[]), kind), Visibility::OwnedBy(42));
    }

    #[rstest]
    #[case(EntityKind::Task)]
    #[case(EntityKind::Tender)]
    fn tech_records_are_private_to_sales(#[case] kind: EntityKind) {
        assert_eq!(visibility(&caller(false, &[Group::Tech]), kind), Visibility::All);
        assert_eq!(visibility(&caller(true, &[]), kind), Visibility::All);
        assert_eq!(visibility(&caller(false, &[Group::Sales]), kind), Visibility::OwnedBy(42));
        assert_eq!(visibility(&caller(false, &[]), kind), Visibility::OwnedBy(42));
    }

    #[test]
    fn tech_data_is_visible_to_everyone() {
        for groups in [&[][..], &[Group::Sales][..], &[Group::Tech][..]] {
            assert_eq!(
                visibility(&caller(false, groups), EntityKind::TechData),
                Visibility::All
            );
        }
    }

    #[rstest]
    #[case(false, &[Group::Sales], EntityKind::Lead, true)]
    #[case(false, &[Group::Tech], EntityKind::Lead, false)]
    #[case(false, &[Group::Sales], EntityKind::Task, false)]
    #[case(false, &[Group::Sales], EntityKind::TechData, false)]
    #[case(false, &[Group::Tech], EntityKind::Tender, true)]
    #[case(false, &[Group::Tech], EntityKind::TechData, true)]
    #[case(false, &[], EntityKind::Customer, false)]
    #[case(true, &[], EntityKind::Task, true)]
    #[case(true, &[], EntityKind::Payment, true)]
    fn write_requires_domain_group_or_admin(
        #[case] admin: bool,
        #[case] groups: &[Group],
        #[case] kind: EntityKind,
        #[case] allowed: bool,
    ) {
        assert_eq!(can_write(&caller(admin, groups), kind), allowed);
    }

    #[test]
    fn reads_are_never_denied() {
        let nobody = caller(false, &[]);
        for kind in EntityKind::ALL {
            assert!(authorize(&nobody, kind, Operation::Read).is_ok());
        }
    }

    #[test]
    fn denied_write_is_permission_error() {
        let sales = caller(false, &[Group::Sales]);
        let err = authorize(&sales, EntityKind::Tender, Operation::Write).unwrap_err();
        assert!(matches!(err, AppError::PermissionDenied(_)));
    }

    #[test]
    fn allowed_write_returns_scope() {
        let tech = caller(false, &[Group::Tech]);
        assert_eq!(
            authorize(&tech, EntityKind::Task, Operation::Write).unwrap(),
            Visibility::All
        );
    }

    #[rstest]
    #[case("9876543210", "98765*****")]
    #[case("123456", "1*****")]
    #[case("12345", "12345")]
    #[case("", "")]
    fn masks_trailing_digits(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(mask_contact(input), expected);
    }

    #[test]
    fn only_non_admin_tech_sees_masked_contacts() {
        assert!(masks_lead_contact(&caller(false, &[Group::Tech])));
        assert!(!masks_lead_contact(&caller(true, &[Group::Tech])));
        assert!(!masks_lead_contact(&caller(false, &[Group::Sales])));
    }
}
