//! [`TargetDirectory`] over SCIM.

use std::collections::BTreeMap;

use dirsync_core::{
    DirectoryError, Email, GroupName, LookupOutcome, NewUser, TargetDirectory, TargetGroup,
    TargetUser,
};

use crate::client::ScimClient;
use crate::model::{PatchRequest, ScimGroup, ScimUser};

impl TargetDirectory for ScimClient {
    fn find_user_by_email(&self, email: &Email) -> LookupOutcome<TargetUser> {
        self.find_user_by_user_name(email.as_str())
            .and_then(|found| found.map(TargetUser::try_from).transpose())
            .into()
    }

    fn create_user(&self, user: &NewUser) -> Result<TargetUser, DirectoryError> {
        ScimClient::create_user(self, &ScimUser::from(user))?.try_into()
    }

    fn delete_user(&self, user: &TargetUser) -> Result<(), DirectoryError> {
        ScimClient::delete_user(self, &user.id)
    }

    fn groups(&self) -> Result<BTreeMap<GroupName, TargetGroup>, DirectoryError> {
        self.list_groups()?
            .into_iter()
            .map(|g| TargetGroup::try_from(g).map(|g| (g.display_name.clone(), g)))
            .collect()
    }

    fn create_group(&self, name: &GroupName) -> Result<TargetGroup, DirectoryError> {
        ScimClient::create_group(self, &ScimGroup::new(name))?.try_into()
    }

    fn delete_group(&self, group: &TargetGroup) -> Result<(), DirectoryError> {
        ScimClient::delete_group(self, &group.id)
    }

    fn is_member(&self, user: &TargetUser, group: &TargetGroup) -> Result<bool, DirectoryError> {
        ScimClient::is_member(self, &group.id, &user.id)
    }

    fn add_member(&self, user: &TargetUser, group: &TargetGroup) -> Result<(), DirectoryError> {
        self.patch_group(&group.id, &PatchRequest::add_member(&user.id))
    }

    fn remove_member(&self, user: &TargetUser, group: &TargetGroup) -> Result<(), DirectoryError> {
        self.patch_group(&group.id, &PatchRequest::remove_member(&user.id))
    }
}
