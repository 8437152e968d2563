//! Member registration, profile and credential operations.
//!
//! Signup checks email and phone uniqueness before inserting, but two
//! concurrent signups can both pass those checks. The UNIQUE constraints in
//! the store are what actually enforce uniqueness; a constraint hit on insert
//! is reported with the same `ALREADY_EXIST_*` code as the pre-check.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use runcrew_crypto::FieldCipher;
use runcrew_crypto::password::{hash_password, verify_password};
use runcrew_db::{Database, MemberRepository};
use runcrew_types::api::{
    LoginRequest, LoginResponse, MemberResponse, PasswordRequest, ProfileVisibilityRequest,
    SignupRequest, UpdateMemberRequest,
};
use runcrew_types::models::{Member, NewMember};

use crate::auth::TokenIssuer;
use crate::error::{ErrorCode, ServiceError, ServiceResult};

pub struct MemberService {
    db: Arc<Database>,
    cipher: FieldCipher,
    tokens: TokenIssuer,
}

impl MemberService {
    pub fn new(db: Arc<Database>, cipher: FieldCipher, tokens: TokenIssuer) -> Self {
        Self { db, cipher, tokens }
    }

    pub fn register_user(&self, req: SignupRequest) -> ServiceResult<MemberResponse> {
        req.validate().map_err(ServiceError::Validation)?;

        // Argon2 runs outside the DB lock.
        let phone_cipher = self.cipher.encrypt(&req.phone_number)?;
        let password_hash = hash_password(&req.password)?;

        let member = self.db.transaction(|conn| {
            if conn.exists_by_email(&req.email)? {
                return Err(ServiceError::from(ErrorCode::AlreadyExistEmail));
            }
            if conn.exists_by_phone_number(&phone_cipher)? {
                return Err(ServiceError::from(ErrorCode::AlreadyExistPhone));
            }

            let member = Member::new(NewMember {
                email: req.email,
                password_hash,
                phone_cipher,
                name: req.name,
                nick_name: req.nick_name,
                gender: req.gender,
                birth_year: req.birth_year,
                activity_region: req.activity_region,
                profile_image_url: req.profile_image,
            });
            conn.insert_member(&member).map_err(ServiceError::from_store)?;
            Ok(member)
        })?;

        info!("Member {} registered", member.id);
        self.to_response(&member)
    }

    pub fn authenticate(&self, req: LoginRequest) -> ServiceResult<LoginResponse> {
        let member = self
            .db
            .with_conn(|conn| conn.find_member_by_email(&req.email))?
            .ok_or(ErrorCode::NotFoundUser)?;

        if !verify_password(&req.password, &member.password)? {
            warn!("Failed login for member {}", member.id);
            return Err(ErrorCode::InvalidPassword.into());
        }

        let token = self.tokens.issue(&member)?;
        Ok(LoginResponse {
            member: self.to_response(&member)?,
            token,
        })
    }

    pub fn get_member_profile(&self, id: Uuid) -> ServiceResult<MemberResponse> {
        let member = self.fetch_or_fail(id)?;
        self.to_response(&member)
    }

    /// Overwrites nickname, gender, birth year and region. Nothing else on
    /// the member is touched.
    pub fn update_member_profile(
        &self,
        id: Uuid,
        req: UpdateMemberRequest,
    ) -> ServiceResult<MemberResponse> {
        req.validate().map_err(ServiceError::Validation)?;

        let member = self.modify(id, |member| {
            member.nick_name = req.nick_name;
            member.gender = req.gender;
            member.birth_year = req.birth_year;
            member.activity_region = req.activity_region;
        })?;
        self.to_response(&member)
    }

    pub fn update_profile_visibility(
        &self,
        id: Uuid,
        req: ProfileVisibilityRequest,
    ) -> ServiceResult<MemberResponse> {
        let member = self.modify(id, |member| member.visibility = req.visibility)?;
        self.to_response(&member)
    }

    pub fn mark_email_verified(&self, id: Uuid) -> ServiceResult<MemberResponse> {
        let member = self.modify(id, |member| member.email_verified = true)?;
        self.to_response(&member)
    }

    /// Old password mismatch and new/confirm mismatch both report
    /// `INVALID_PASSWORD`. Any other failure reports `ENCRYPTION_ERROR`.
    pub fn update_member_password(&self, id: Uuid, req: PasswordRequest) -> ServiceResult<()> {
        let member = self.fetch_or_fail(id)?;
        self.change_password(&member, &req)
            .map_err(ServiceError::into_credential_error)
    }

    fn change_password(&self, member: &Member, req: &PasswordRequest) -> ServiceResult<()> {
        if !verify_password(&req.old_password, &member.password)? {
            warn!("Password change rejected for member {}: old password mismatch", member.id);
            return Err(ErrorCode::InvalidPassword.into());
        }
        if req.new_password != req.confirm_password {
            return Err(ErrorCode::InvalidPassword.into());
        }
        req.validate().map_err(ServiceError::Validation)?;

        // Stored as a hash like signup so the new password can be verified.
        let password_hash = hash_password(&req.new_password)?;
        let mut audit = member.audit;
        audit.touch();

        let updated = self
            .db
            .with_conn(|conn| conn.update_password(member.id, &password_hash, audit.updated_at))?;
        if !updated {
            return Err(ErrorCode::NotFoundUser.into());
        }

        info!("Password changed for member {}", member.id);
        Ok(())
    }

    /// Hard delete after re-checking the password. Run records go with the
    /// member.
    pub fn delete_member(&self, id: Uuid, password: &str) -> ServiceResult<()> {
        let member = self.fetch_or_fail(id)?;
        self.remove(&member, password)
            .map_err(ServiceError::into_credential_error)
    }

    fn remove(&self, member: &Member, password: &str) -> ServiceResult<()> {
        if !verify_password(password, &member.password)? {
            warn!("Account deletion rejected for member {}: password mismatch", member.id);
            return Err(ErrorCode::InvalidPassword.into());
        }

        if !self.db.with_conn(|conn| conn.delete_member(member.id))? {
            return Err(ErrorCode::NotFoundUser.into());
        }

        info!("Member {} deleted", member.id);
        Ok(())
    }

    fn fetch_or_fail(&self, id: Uuid) -> ServiceResult<Member> {
        let member = self
            .db
            .with_conn(|conn| conn.find_member_by_id(id))?
            .ok_or(ErrorCode::NotFoundUser)?;
        Ok(member)
    }

    /// Fetch-or-fail, apply `change`, bump `updated_at` and save, all in one
    /// transaction.
    fn modify(&self, id: Uuid, change: impl FnOnce(&mut Member)) -> ServiceResult<Member> {
        self.db.transaction(|conn| {
            let mut member = conn
                .find_member_by_id(id)?
                .ok_or(ErrorCode::NotFoundUser)?;

            change(&mut member);
            member.audit.touch();

            conn.update_member(&member).map_err(ServiceError::from_store)?;
            Ok(member)
        })
    }

    fn to_response(&self, member: &Member) -> ServiceResult<MemberResponse> {
        let phone_number = self.cipher.decrypt(&member.phone_number)?;
        Ok(MemberResponse::from_member(member, phone_number))
    }
}
